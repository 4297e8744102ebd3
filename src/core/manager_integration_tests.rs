//! Integration tests for SyncManager batch runs
//!
//! Covers failure isolation across jobs:
//! - Authentication and extraction failures stay inside their job
//! - Batch jobs loaded from a configuration file run in file order
//! - Configuration failures end the run

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use super::super::downloader::FetchOrchestrator;
    use super::super::error_handling::{classify_extraction_failure, ErrorCategory};
    use super::super::manager::*;
    use super::super::models::*;
    use super::super::youtube_downloader::{MediaTransfer, PlaylistExtractor, TransferRequest};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    /// Serves playlists by reference; "private" and "gone" fail like yt-dlp
    /// does, "misconfigured" fails for the whole run
    struct ScriptedExtractor {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PlaylistExtractor for ScriptedExtractor {
        async fn extract_entries(&self, playlist_reference: &str) -> AppResult<Vec<Entry>> {
            self.seen.lock().unwrap().push(playlist_reference.to_string());
            if playlist_reference.contains("private") {
                return Err(classify_extraction_failure(
                    "ERROR: [youtube:tab] PLprivate: Sign in to confirm your age\n",
                ));
            }
            if playlist_reference.contains("misconfigured") {
                return Err(AppError::Configuration(
                    "cookie file is not a Netscape cookie jar".to_string(),
                ));
            }
            if playlist_reference.contains("gone") {
                return Err(classify_extraction_failure(
                    "ERROR: [youtube:tab] PLgone: The playlist does not exist\n",
                ));
            }
            let id = playlist_reference.rsplit('=').next().unwrap_or("x");
            Ok(vec![Entry::new(
                Some(id),
                &format!("Track {}", id),
                &format!("https://youtu.be/{}", id),
            )])
        }
    }

    struct DiskTransfer;

    #[async_trait]
    impl MediaTransfer for DiskTransfer {
        async fn transfer(&self, request: &TransferRequest) -> AppResult<()> {
            let path = format!(
                "{}.{}",
                request.output_stem.display(),
                request.audio_format.file_extension()
            );
            fs::write(path, b"audio")?;
            Ok(())
        }
    }

    fn manager(extractor: Arc<ScriptedExtractor>) -> SyncManager {
        SyncManager::new(extractor, FetchOrchestrator::new(Arc::new(DiskTransfer)))
    }

    #[tokio::test]
    async fn test_failed_jobs_do_not_stop_the_batch() -> AppResult<()> {
        let dir = tempdir()?;
        let ini = format!(
            "[manual]\nsave_path = {root}/manual\n\n\
             [private]\nsave_path = {root}/private\nvideo_url = https://www.youtube.com/playlist?list=private\n\n\
             [gone]\nsave_path = {root}/gone\nvideo_url = https://www.youtube.com/playlist?list=gone\n\n\
             [good]\nsave_path = {root}/good\nvideo_url = https://www.youtube.com/playlist?list=good\naudio_format = mp3\n",
            root = dir.path().display()
        );
        let jobs = AppConfig::from_ini_str(&ini)?.resolve_jobs(&JobSource::Batch)?;
        assert_eq!(
            jobs.iter().map(|j| j.label.as_str()).collect::<Vec<_>>(),
            vec!["private", "gone", "good"]
        );

        let extractor = Arc::new(ScriptedExtractor {
            seen: Mutex::new(Vec::new()),
        });
        let summary = manager(extractor.clone()).run_all(&jobs).await;

        assert_eq!(extractor.seen.lock().unwrap().len(), 3);
        assert_eq!(summary.outcomes.len(), 3);
        match &summary.outcomes[0] {
            JobOutcome::Failed { label, category, .. } => {
                assert_eq!(label, "private");
                assert_eq!(*category, ErrorCategory::Authentication);
            }
            other => panic!("expected failure, got {other:?}"),
        }
        match &summary.outcomes[1] {
            JobOutcome::Failed { category, .. } => {
                assert_eq!(*category, ErrorCategory::Extraction)
            }
            other => panic!("expected failure, got {other:?}"),
        }
        match &summary.outcomes[2] {
            JobOutcome::Completed(report) => {
                assert_eq!(report.downloaded, 1);
                assert!(dir.path().join("good").join("Track good.mp3").exists());
            }
            other => panic!("expected completion, got {other:?}"),
        }

        assert!(summary.has_failures());
        assert_eq!(summary.failed_jobs(), 2);
        assert_eq!(summary.tally().new, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_clean_batch_has_no_failures() -> AppResult<()> {
        let dir = tempdir()?;
        let jobs = vec![Job {
            label: "good".to_string(),
            destination_dir: dir.path().join("out"),
            playlist_reference: "https://www.youtube.com/playlist?list=abc".to_string(),
            audio_format: AudioFormat::Flac,
            preferred_quality_kbps: 0,
            redownload_missing: true,
        }];
        let extractor = Arc::new(ScriptedExtractor {
            seen: Mutex::new(Vec::new()),
        });

        let summary = manager(extractor).run_all(&jobs).await;

        assert!(!summary.has_failures());
        assert!(summary.finished_at >= summary.started_at);
        assert_eq!(summary.completed().count(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_run_scoped_failure_stops_remaining_jobs() -> AppResult<()> {
        let dir = tempdir()?;
        let job = |label: &str, list: &str| Job {
            label: label.to_string(),
            destination_dir: dir.path().join(label),
            playlist_reference: format!("https://www.youtube.com/playlist?list={}", list),
            audio_format: AudioFormat::Mp3,
            preferred_quality_kbps: 0,
            redownload_missing: true,
        };
        let jobs = vec![
            job("first", "one"),
            job("broken", "misconfigured"),
            job("never", "two"),
        ];
        let extractor = Arc::new(ScriptedExtractor {
            seen: Mutex::new(Vec::new()),
        });

        let summary = manager(extractor.clone()).run_all(&jobs).await;

        assert!(summary.halted);
        assert_eq!(summary.outcomes.len(), 2);
        assert_eq!(extractor.seen.lock().unwrap().len(), 2);
        assert!(!dir.path().join("never").exists());
        match &summary.outcomes[1] {
            JobOutcome::Failed { category, .. } => {
                assert_eq!(*category, ErrorCategory::Configuration)
            }
            other => panic!("expected failure, got {other:?}"),
        }

        Ok(())
    }
}
