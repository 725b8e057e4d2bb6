//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置 -> Funnel -> sinks 的端到端测试（无需真实 SMTP 服务）
//! - 慢 sink 与失败 sink 的隔离验证

#[cfg(test)]
mod contract_tests {
    use contracts::{ErrorReport, ErrorValue};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_report_snapshot() {
        let value = ErrorValue::from(
            ErrorReport::new("disk full")
                .with_kind("io")
                .with_cause("no space left on device"),
        );
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "message": "disk full",
                "kind": "io",
                "chain": ["no space left on device"],
            })
        );
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use config_loader::{ConfigFormat, ConfigLoader, ConfigSource};
    use contracts::{ContractError, ErrorSink, ErrorValue, MailMessage, MailTransport};
    use funnel::{Funnel, FunnelError};
    use tempfile::tempdir;

    #[derive(Clone, Default)]
    struct RecordingTransport {
        sent: Arc<Mutex<Vec<MailMessage>>>,
    }

    impl MailTransport for RecordingTransport {
        async fn send_mail(&self, message: &MailMessage) -> Result<(), ContractError> {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    /// Sink that takes a while per write
    struct SlowSink {
        delay: Duration,
        written: Arc<Mutex<Vec<String>>>,
    }

    impl ErrorSink for SlowSink {
        fn name(&self) -> &str {
            "slow"
        }

        async fn write(&mut self, error: &ErrorValue) -> Result<(), ContractError> {
            tokio::time::sleep(self.delay).await;
            self.written.lock().unwrap().push(error.to_string());
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    /// Sink whose every write fails
    struct BrokenSink;

    impl ErrorSink for BrokenSink {
        fn name(&self) -> &str {
            "broken"
        }

        async fn write(&mut self, _error: &ErrorValue) -> Result<(), ContractError> {
            Err(ContractError::sink_write("broken", "device unplugged"))
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    /// Config file -> Funnel -> file sink, for every kind of error value
    #[tokio::test]
    async fn test_e2e_config_to_log_file() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("errors.log");
        let toml = format!(
            "title = \"[e2e]\"\ntrace = false\n\n[log]\npath = {:?}\n",
            log_path.display().to_string()
        );

        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        let funnel = Funnel::from_config(&config).unwrap();
        assert_eq!(funnel.listener_count("error"), 1);

        funnel
            .raise("plain message")
            .raise(std::io::Error::new(std::io::ErrorKind::NotFound, "missing.cfg"))
            .raise(serde_json::json!({ "code": 42 }));
        funnel.shutdown().await;

        let content = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[0].ends_with("Error log started."));
        assert!(content.contains("\"error\": \"plain message\""));
        assert!(content.contains("missing.cfg"));
        assert!(content.contains("\"code\": 42"));
        assert!(content.contains(&format!("\"pid\": {}", std::process::id())));

        let plain = content.find("plain message").unwrap();
        let io = content.find("missing.cfg").unwrap();
        let data = content.find("\"code\"").unwrap();
        assert!(plain < io && io < data);
    }

    /// A wrapped callback failure reaches file and email exactly once
    #[tokio::test]
    async fn test_e2e_wrapped_failure_fans_out() {
        let dir = tempdir().unwrap();
        let funnel = Funnel::new();
        let transport = RecordingTransport::default();
        let sent = Arc::clone(&transport.sent);

        let file = funnel.log(dir.path().join("errors.log")).unwrap();
        let email = funnel
            .notify_with(["ops@example.com", "dev@example.com"], "bot@example.com", transport)
            .unwrap();
        funnel
            .on("error", file)
            .on("error", email)
            .set_title(Some("[prod] job failed".into()));

        let job = funnel.wrap(|_, input: String| -> Result<usize, String> {
            if input.is_empty() {
                return Err("<empty> input & nothing to do".to_string());
            }
            Ok(input.len())
        });
        assert_eq!(job.call(Ok::<_, String>("abc".to_string())), Some(3));
        assert_eq!(job.exec(String::new()), None);
        funnel.shutdown().await;

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "[prod] job failed");
        assert_eq!(sent[0].from, "bot@example.com");
        assert_eq!(sent[0].to, vec!["ops@example.com", "dev@example.com"]);
        assert!(sent[0].html.contains("&lt;empty&gt; input &amp; nothing to do"));

        let content = std::fs::read_to_string(dir.path().join("errors.log")).unwrap();
        assert_eq!(content.matches("nothing to do").count(), 1);
    }

    /// Raising never waits for a slow sink, and shutdown drains it
    #[tokio::test]
    async fn test_e2e_slow_sink_does_not_block_raise() {
        let funnel = Funnel::with_backlog_warning(16);
        let written = Arc::new(Mutex::new(Vec::new()));
        let slow = funnel
            .attach(SlowSink {
                delay: Duration::from_millis(50),
                written: Arc::clone(&written),
            })
            .unwrap();
        funnel.on("error", slow);

        let started = Instant::now();
        for i in 0..5 {
            funnel.raise(format!("error {i}"));
        }
        assert!(started.elapsed() < Duration::from_millis(50));

        funnel.shutdown().await;
        assert_eq!(
            *written.lock().unwrap(),
            vec!["error 0", "error 1", "error 2", "error 3", "error 4"]
        );
    }

    /// A burst far past the backlog warning level reaches the file intact
    #[tokio::test]
    async fn test_e2e_burst_is_fully_logged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("errors.log");
        let funnel = Funnel::with_backlog_warning(4);
        let file = funnel.log(&path).unwrap();
        funnel.on("error", file);

        for i in 0..300 {
            funnel.raise(format!("burst-{i}"));
        }
        let sinks = funnel.shutdown().await;

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("burst-").count(), 300);
        assert!(content.contains("burst-299"));

        let (_, snapshot) = &sinks[0];
        assert_eq!(snapshot.write_count, 300);
        assert_eq!(snapshot.dropped_count, 0);
        assert!(snapshot.peak_queue_len > 4);
    }

    /// A failing sink does not affect its siblings
    #[tokio::test]
    async fn test_e2e_broken_sink_is_isolated() {
        let dir = tempdir().unwrap();
        let funnel = Funnel::new();
        let broken = funnel.attach(BrokenSink).unwrap();
        let file = funnel.log(dir.path().join("errors.log")).unwrap();
        funnel.on("error", broken).on("error", file);

        funnel.raise("still logged");
        tokio::time::sleep(Duration::from_millis(100)).await;

        let metrics = funnel.metrics();
        assert_eq!(metrics[0].0, "broken");
        assert_eq!(metrics[0].1.failure_count, 1);
        assert_eq!(metrics[1].1.write_count, 1);

        funnel.shutdown().await;
        let content = std::fs::read_to_string(dir.path().join("errors.log")).unwrap();
        assert!(content.contains("still logged"));
    }

    /// Listener panics are contained and every other listener still runs
    #[tokio::test]
    async fn test_e2e_listener_panic_with_sinks() {
        let dir = tempdir().unwrap();
        let funnel = Funnel::new();
        let file = funnel.log(dir.path().join("errors.log")).unwrap();

        funnel
            .on("error", Arc::new(|_: &ErrorValue| panic!("bad listener")))
            .on("error", file)
            .raise("survived");
        funnel.shutdown().await;

        let content = std::fs::read_to_string(dir.path().join("errors.log")).unwrap();
        assert!(content.contains("survived"));
    }

    /// Mail settings resolved from rc layers feed a real SMTP transport
    #[tokio::test]
    async fn test_e2e_mail_namespace_to_smtp_transport() {
        let dir = tempdir().unwrap();
        let rc = dir.path().join(".mailrc");
        std::fs::write(
            &rc,
            "host = \"smtp.example.com\"\n[auth]\nuser = \"bot@example.com\"\npass = \"from-file\"\n",
        )
        .unwrap();

        let sources = vec![
            ConfigSource::File(rc),
            ConfigSource::Env(vec![
                ("mail_port".to_string(), "2525".to_string()),
                ("mail_auth__pass".to_string(), "from-env".to_string()),
            ]),
        ];
        let mail = ConfigLoader::load_mail_from(&sources).unwrap();
        assert_eq!(mail.host, "smtp.example.com");
        assert_eq!(mail.port, 2525);
        assert_eq!(mail.auth.pass, "from-env");

        let funnel = Funnel::new();
        let listener = funnel.notify(["ops@example.com"], Some(mail)).unwrap();
        assert_eq!(funnel.metrics()[0].0, "email:ops@example.com");
        drop(listener);
        funnel.shutdown().await;
    }

    #[test]
    fn test_e2e_sinks_need_runtime() {
        let funnel = Funnel::new();
        let result = funnel.notify_with("ops@example.com", "bot@example.com", RecordingTransport::default());
        assert!(matches!(result, Err(FunnelError::NoRuntime)));
    }
}
