//! Import/export of the crawler's configuration lists.
//!
//! Both kinds use the same protocol; only the endpoint and the saved filename differ.

use crate::model::{ConfigKind, ImportReply};
use crate::remote::{RemoteError, RemoteJobClient};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum TransferError {
    #[error("could not read {}: {source}", path.display())]
    ReadLocal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not save {}: {source}", path.display())]
    WriteLocal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Finished transfer, handed back to the controller.
#[derive(Debug)]
pub(crate) enum Transfer {
    Imported {
        kind: ConfigKind,
        outcome: Result<ImportReply, TransferError>,
    },
    Exported {
        kind: ConfigKind,
        outcome: Result<PathBuf, TransferError>,
    },
    /// Quiet export used to fill a panel.
    Listed {
        kind: ConfigKind,
        outcome: Result<Vec<String>, TransferError>,
    },
}

/// Upload a local file as the new list for `kind`.
pub(crate) async fn import_file(
    client: &RemoteJobClient,
    kind: ConfigKind,
    path: &Path,
) -> Result<ImportReply, TransferError> {
    let contents = tokio::fs::read(path)
        .await
        .map_err(|source| TransferError::ReadLocal {
            path: path.to_path_buf(),
            source,
        })?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_else(|| kind.export_filename())
        .to_string();
    Ok(client.import_config(kind, file_name, contents).await?)
}

/// Download the list for `kind` into `dir` under its fixed filename.
pub(crate) async fn export_to_dir(
    client: &RemoteJobClient,
    kind: ConfigKind,
    dir: &Path,
) -> Result<PathBuf, TransferError> {
    let body = client.export_config(kind).await?;
    let path = dir.join(kind.export_filename());
    let write_err = |source: std::io::Error| TransferError::WriteLocal {
        path: path.clone(),
        source,
    };
    tokio::fs::create_dir_all(dir).await.map_err(write_err)?;
    tokio::fs::write(&path, &body).await.map_err(write_err)?;
    Ok(path)
}

pub(crate) async fn list_entries(
    client: &RemoteJobClient,
    kind: ConfigKind,
) -> Result<Vec<String>, TransferError> {
    let body = client.export_config(kind).await?;
    Ok(entry_lines(&body))
}

fn entry_lines(body: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(body)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MonitorConfig;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "crawl-monitor-{name}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn entry_lines_skips_blank_lines() {
        assert_eq!(
            entry_lines(b"rust\r\n\n  tokio \n"),
            vec!["rust".to_string(), "tokio".to_string()]
        );
    }

    #[tokio::test]
    async fn export_writes_fixed_filename() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/export_terms"))
            .respond_with(ResponseTemplate::new(200).set_body_string("rust\ntokio\n"))
            .mount(&server)
            .await;
        let client = RemoteJobClient::new(&MonitorConfig::for_tests(&server.uri())).unwrap();
        let dir = scratch_dir("export");

        let saved = export_to_dir(&client, ConfigKind::Terms, &dir).await.unwrap();
        assert_eq!(saved, dir.join("terms_export.txt"));
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), "rust\ntokio\n");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn import_of_missing_file_never_hits_the_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/import_sites"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let client = RemoteJobClient::new(&MonitorConfig::for_tests(&server.uri())).unwrap();
        let missing = scratch_dir("import").join("nope.txt");

        let err = import_file(&client, ConfigKind::Sites, &missing)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::ReadLocal { .. }));
    }
}
