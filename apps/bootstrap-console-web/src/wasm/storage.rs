use super::*;

    /// `localStorage`-backed settings store.
    pub(super) struct LocalSettingsStore {
        storage: web_sys::Storage,
    }

    impl LocalSettingsStore {
        pub(super) fn open() -> Result<Self, SettingsError> {
            let window = web_sys::window().ok_or_else(|| SettingsError::Unavailable {
                message: "window is unavailable".to_string(),
            })?;
            let storage = window
                .local_storage()
                .map_err(|_| SettingsError::Unavailable {
                    message: "failed to access local storage".to_string(),
                })?
                .ok_or_else(|| SettingsError::Unavailable {
                    message: "local storage is disabled".to_string(),
                })?;
            Ok(Self { storage })
        }
    }

    impl SettingsStore for LocalSettingsStore {
        fn read(&self, key: &str) -> Result<Option<String>, SettingsError> {
            self.storage
                .get_item(key)
                .map_err(|error| SettingsError::Read {
                    message: format!("{error:?}"),
                })
        }

        fn write(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
            self.storage
                .set_item(key, value)
                .map_err(|error| SettingsError::Write {
                    message: format!("{error:?}"),
                })
        }
    }

    /// Loads saved CLI settings into the session and their controls.
    pub(super) fn restore_cli_settings() {
        let loaded = LocalSettingsStore::open().and_then(|store| load_cli_settings(&store));
        match loaded {
            Ok(Some(settings)) => {
                let restored =
                    SESSION.with(|session| session.borrow_mut().form.hydrate(&settings));
                apply_values(settings.iter().map(|(id, value)| (id.as_str(), value)));
                log_info(&format!("restored {restored} saved cli settings"));
            }
            Ok(None) => {}
            Err(error) => log_error(&format!("saved cli settings ignored: {error}")),
        }
    }

    /// Saves the CLI settings, or clears them when the toggle is off.
    pub(super) fn persist_cli_settings() {
        let result = LocalSettingsStore::open().and_then(|mut store| {
            SESSION.with(|session| {
                let session = session.borrow();
                let enabled = session.form.checked(fields::SAVE_CLI_SETTING);
                save_cli_settings(&mut store, enabled, &session.form)
            })
        });
        if let Err(error) = result {
            log_error(&format!("cli settings not saved: {error}"));
        }
    }
