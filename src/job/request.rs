//! Incoming job descriptions and their validation

use std::path::{Component, Path};

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{ChunkDescriptor, DownloadJob, JobError};

/// Raw invocation payload: `{"chunks": ["http://..."], "filename": "bundle.bin"}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JobRequest {
    pub chunks: Vec<String>,
    pub filename: String,
}

impl JobRequest {
    pub fn new(chunks: Vec<String>, filename: impl Into<String>) -> Self {
        Self {
            chunks,
            filename: filename.into(),
        }
    }

    /// Parse a JSON job description. Missing or wrong-typed fields are
    /// `InvalidInput`.
    pub fn from_json(raw: &str) -> Result<Self, JobError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Accept either the bare object or the single-element argument array
    /// used by plugin bridges (`[{"chunks": ..., "filename": ...}]`)
    pub fn from_value(value: Value) -> Result<Self, JobError> {
        let object = match value {
            Value::Array(mut args) if args.len() == 1 => args.remove(0),
            Value::Array(args) => {
                return Err(JobError::InvalidInput(format!(
                    "expected exactly one job argument, got {}",
                    args.len()
                )));
            }
            other => other,
        };
        Ok(serde_json::from_value(object)?)
    }

    /// Check the shape and every location before any network access
    pub fn validate(self) -> Result<DownloadJob, JobError> {
        if self.chunks.is_empty() {
            return Err(JobError::InvalidInput("chunk list is empty".to_string()));
        }

        validate_filename(&self.filename)?;

        let chunks = self
            .chunks
            .into_iter()
            .enumerate()
            .map(|(index, location)| parse_location(index, location))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DownloadJob {
            id: Uuid::now_v7(),
            output_name: self.filename,
            chunks,
        })
    }
}

fn parse_location(index: usize, location: String) -> Result<ChunkDescriptor, JobError> {
    let invalid = |reason: String| JobError::InvalidUrl {
        index,
        location: location.clone(),
        reason,
    };

    let url = Url::parse(location.trim()).map_err(|e| invalid(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }

    if !url.has_host() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(ChunkDescriptor { index, url })
}

/// The output name is joined onto the storage root, so it must stay inside it
fn validate_filename(filename: &str) -> Result<(), JobError> {
    if filename.trim().is_empty() {
        return Err(JobError::InvalidInput("filename is empty".to_string()));
    }

    let escapes = Path::new(filename)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

    if escapes || filename.ends_with('/') {
        return Err(JobError::InvalidInput(format!(
            "filename must be a relative file path inside the storage root: '{filename}'"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(chunks: &[&str], filename: &str) -> JobRequest {
        JobRequest::new(chunks.iter().map(|c| c.to_string()).collect(), filename)
    }

    #[test]
    fn test_valid_request() {
        let job = request(&["http://x/a", "https://cdn.example.com/b?part=2"], "bundle.bin")
            .validate()
            .unwrap();

        assert_eq!(job.output_name, "bundle.bin");
        assert_eq!(job.chunks.len(), 2);
        assert_eq!(job.chunks[0].index, 0);
        assert_eq!(job.chunks[1].url.as_str(), "https://cdn.example.com/b?part=2");
    }

    #[test]
    fn test_empty_chunk_list_is_invalid_input() {
        let err = request(&[], "bundle.bin").validate().unwrap_err();
        assert_eq!(err.code(), "InvalidInput");
    }

    #[test]
    fn test_not_a_url() {
        let err = request(&["not a url"], "bundle.bin").validate().unwrap_err();
        assert!(matches!(err, JobError::InvalidUrl { index: 0, .. }));
        assert_eq!(err.code(), "InvalidURL");
    }

    #[test]
    fn test_later_bad_chunk_reports_its_index() {
        let err = request(&["http://x/a", "ftp://x/b", "http://x/c"], "bundle.bin")
            .validate()
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidUrl { index: 1, .. }));
    }

    #[test]
    fn test_bad_filenames() {
        for name in ["", "  ", "/etc/passwd", "../escape.bin", "maps/../../x", "dir/"] {
            let err = request(&["http://x/a"], name).validate().unwrap_err();
            assert_eq!(err.code(), "InvalidInput", "{name:?} should be rejected");
        }

        assert!(request(&["http://x/a"], "maps/italy.mbtiles").validate().is_ok());
    }

    #[test]
    fn test_from_json_shape_errors() {
        assert!(JobRequest::from_json(r#"{"chunks": ["http://x/a"], "filename": "a"}"#).is_ok());

        for raw in [
            r#"{"chunks": ["http://x/a"]}"#,
            r#"{"chunks": "http://x/a", "filename": "a"}"#,
            r#"{"chunks": [1, 2], "filename": "a"}"#,
            r#"{"chunks": [], "filename": 7}"#,
            "not json",
        ] {
            let err = JobRequest::from_json(raw).unwrap_err();
            assert_eq!(err.code(), "InvalidInput", "{raw} should be rejected");
        }
    }

    #[test]
    fn test_from_value_accepts_argument_array() {
        let args = json!([{"chunks": ["http://x/a"], "filename": "a.bin"}]);
        let parsed = JobRequest::from_value(args).unwrap();
        assert_eq!(parsed, request(&["http://x/a"], "a.bin"));

        let err = JobRequest::from_value(json!([])).unwrap_err();
        assert_eq!(err.code(), "InvalidInput");
    }
}
