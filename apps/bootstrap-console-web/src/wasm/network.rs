use super::*;

    fn request_error(error: impl std::fmt::Display) -> PageError {
        PageError::Request {
            message: error.to_string(),
        }
    }

    fn js_error(context: &str, error: &JsValue) -> PageError {
        PageError::Request {
            message: format!("{context}: {error:?}"),
        }
    }

    async fn ensure_success(
        response: gloo_net::http::Response,
    ) -> Result<gloo_net::http::Response, PageError> {
        if response.ok() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(PageError::Http {
            status,
            body: body.trim().to_string(),
        })
    }

    pub(super) async fn fetch_env() -> Result<EnvSnapshot, PageError> {
        let response = Request::get(ENV_PATH)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(request_error)?;
        ensure_success(response)
            .await?
            .json::<EnvSnapshot>()
            .await
            .map_err(|error| PageError::Decode {
                message: error.to_string(),
            })
    }

    pub(super) async fn upload_app_file(file: &web_sys::File) -> Result<UploadOutcome, PageError> {
        let form_data =
            web_sys::FormData::new().map_err(|error| js_error("form data unavailable", &error))?;
        form_data
            .append_with_blob_and_filename(UPLOAD_FIELD, file, &file.name())
            .map_err(|error| js_error("attach app file", &error))?;
        let response = Request::post(UPLOAD_PATH)
            .body(form_data)
            .map_err(request_error)?
            .send()
            .await
            .map_err(request_error)?;
        ensure_success(response)
            .await?
            .json::<UploadOutcome>()
            .await
            .map_err(|error| PageError::Decode {
                message: error.to_string(),
            })
    }

    pub(super) async fn stop_script(job_id: Option<&str>) -> Result<StopResponse, PageError> {
        let response = Request::get(&stop_script_path(job_id))
            .header("accept", "application/json")
            .send()
            .await
            .map_err(request_error)?;
        ensure_success(response)
            .await?
            .json::<StopResponse>()
            .await
            .map_err(|error| PageError::Decode {
                message: error.to_string(),
            })
    }

    /// Starts a run and returns the captured job id with the body as a
    /// stream of raw chunks.
    pub(super) async fn start_script(
        path: &str,
    ) -> Result<(Option<String>, ChunkStream), PageError> {
        let response = ensure_success(Request::get(path).send().await.map_err(request_error)?).await?;
        let job_id = response.headers().get(JOB_ID_HEADER);
        let body = response.body().ok_or_else(|| PageError::Decode {
            message: "run response has no body".to_string(),
        })?;
        let reader = body
            .get_reader()
            .dyn_into::<web_sys::ReadableStreamDefaultReader>()
            .map_err(|error| js_error("stream reader unavailable", &error))?;

        let chunks = futures_util::stream::unfold(Some(reader), |reader| async move {
            let reader = reader?;
            match read_chunk(&reader).await {
                Ok(Some(bytes)) => Some((Ok(bytes), Some(reader))),
                Ok(None) => None,
                Err(error) => Some((Err(error), None)),
            }
        });
        Ok((job_id, chunks.boxed_local()))
    }

    async fn read_chunk(
        reader: &web_sys::ReadableStreamDefaultReader,
    ) -> Result<Option<Vec<u8>>, PageError> {
        let result = JsFuture::from(reader.read())
            .await
            .map_err(|error| js_error("stream read failed", &error))?;
        let done = js_sys::Reflect::get(&result, &JsValue::from_str("done"))
            .map_err(|error| js_error("stream read result", &error))?
            .as_bool()
            .unwrap_or(true);
        if done {
            return Ok(None);
        }
        let value = js_sys::Reflect::get(&result, &JsValue::from_str("value"))
            .map_err(|error| js_error("stream read result", &error))?;
        Ok(Some(js_sys::Uint8Array::new(&value).to_vec()))
    }
