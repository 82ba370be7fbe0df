use crate::config::{NotificationsCfg, SettingsCfg};
use crate::types::Signal;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("failed to run {command}: {source}")]
    Spawn { command: String, source: std::io::Error },
    #[error("{command} exited with {status}")]
    Status { command: String, status: std::process::ExitStatus },
}

pub trait Clipboard: Send + Sync {
    fn copy(&self, text: &str) -> Result<(), ActionError>;
}

pub trait Browser: Send + Sync {
    fn open(&self, url: &str) -> Result<(), ActionError>;
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
    fn beep(&self);
}

/// Clipboard backed by the platform's copy command, fed through stdin.
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn copy(&self, text: &str) -> Result<(), ActionError> {
        let (program, args): (&str, &[&str]) = if cfg!(target_os = "macos") {
            ("pbcopy", &[])
        } else if cfg!(target_os = "windows") {
            ("clip", &[])
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            ("wl-copy", &[])
        } else {
            ("xclip", &["-selection", "clipboard"])
        };

        let spawn_err = |source| ActionError::Spawn { command: program.to_string(), source };
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).map_err(spawn_err)?;
        }
        let status = child.wait().map_err(spawn_err)?;
        if !status.success() {
            return Err(ActionError::Status { command: program.to_string(), status });
        }
        Ok(())
    }
}

pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), ActionError> {
        let mut command = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", ""]);
            c
        } else {
            Command::new("xdg-open")
        };
        command.arg(url);
        let status = command
            .status()
            .map_err(|source| ActionError::Spawn { command: format!("{:?}", command), source })?;
        if !status.success() {
            return Err(ActionError::Status { command: format!("{:?}", command), status });
        }
        Ok(())
    }
}

/// Logs the notification; the beep is the terminal bell.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        info!("🔔 {}", message);
    }

    fn beep(&self) {
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionReport {
    pub copied: bool,
    pub opened: bool,
    pub notified: bool,
    pub beeped: bool,
}

/// Runs the downstream side effects for an accepted signal. Failures are
/// logged and never reach the engine.
pub struct ActionDispatcher {
    clipboard: Arc<dyn Clipboard>,
    browser: Arc<dyn Browser>,
    notifier: Arc<dyn Notifier>,
    auto_copy: bool,
    auto_open: bool,
    notifications: NotificationsCfg,
}

impl ActionDispatcher {
    pub fn new(
        clipboard: Arc<dyn Clipboard>,
        browser: Arc<dyn Browser>,
        notifier: Arc<dyn Notifier>,
        settings: &SettingsCfg,
        notifications: &NotificationsCfg,
    ) -> Self {
        Self {
            clipboard,
            browser,
            notifier,
            auto_copy: settings.auto_copy_clipboard,
            auto_open: settings.auto_open_gmgn,
            notifications: notifications.clone(),
        }
    }

    pub fn system(settings: &SettingsCfg, notifications: &NotificationsCfg) -> Self {
        Self::new(Arc::new(SystemClipboard), Arc::new(SystemBrowser), Arc::new(ConsoleNotifier), settings, notifications)
    }

    /// Fire-and-forget on the blocking pool.
    pub fn dispatch(self: &Arc<Self>, signal: Signal) {
        let dispatcher = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            dispatcher.run(&signal);
        });
    }

    pub fn run(&self, signal: &Signal) -> ActionReport {
        let mut report = ActionReport::default();
        let symbol = signal.mexc_symbol();

        if self.auto_copy {
            match self.clipboard.copy(&symbol) {
                Ok(()) => {
                    info!("📋 Copied: {}", symbol);
                    report.copied = true;
                }
                Err(e) => warn!("[Actions] clipboard copy failed: {}", e),
            }
        }

        match (&signal.contract, self.auto_open) {
            (Some(contract), true) => match self.browser.open(&contract.url) {
                Ok(()) => {
                    info!("🌐 Opened: {}", contract.url);
                    report.opened = true;
                }
                Err(e) => warn!("[Actions] failed to open {}: {}", contract.url, e),
            },
            (None, true) => info!("[Actions] no contract for {}, nothing to open", signal.ticker),
            (_, false) => {}
        }

        if self.notifications.enabled {
            let message = format!("New ticker from @{}: {} -> {}", signal.source, signal.ticker, symbol);
            if self.notifications.desktop {
                self.notifier.notify(&message);
                report.notified = true;
            }
            if self.notifications.sound {
                self.notifier.beep();
                report.beeped = true;
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContractInfo, ContractKind};
    use chrono::Utc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        copied: Mutex<Vec<String>>,
        opened: Mutex<Vec<String>>,
        notified: Mutex<Vec<String>>,
        beeps: Mutex<usize>,
        fail: bool,
    }

    impl Clipboard for Recorder {
        fn copy(&self, text: &str) -> Result<(), ActionError> {
            if self.fail {
                return Err(ActionError::Spawn {
                    command: "fake".into(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
                });
            }
            self.copied.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    impl Browser for Recorder {
        fn open(&self, url: &str) -> Result<(), ActionError> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    impl Notifier for Recorder {
        fn notify(&self, message: &str) {
            self.notified.lock().unwrap().push(message.to_string());
        }

        fn beep(&self) {
            *self.beeps.lock().unwrap() += 1;
        }
    }

    fn signal(contract: Option<ContractInfo>) -> Signal {
        Signal {
            ticker: "DEXE".into(),
            direction: None,
            direction_raw: None,
            contract,
            source: "mexcTracker".into(),
            message_id: 1,
            received_at: Utc::now(),
        }
    }

    fn dispatcher(recorder: Arc<Recorder>, settings: SettingsCfg) -> ActionDispatcher {
        with_notifications(recorder, settings, NotificationsCfg::default())
    }

    fn with_notifications(
        recorder: Arc<Recorder>,
        settings: SettingsCfg,
        notifications: NotificationsCfg,
    ) -> ActionDispatcher {
        ActionDispatcher::new(recorder.clone(), recorder.clone(), recorder, &settings, &notifications)
    }

    #[test]
    fn copies_symbol_and_opens_gmgn() {
        let recorder = Arc::new(Recorder::default());
        let d = dispatcher(recorder.clone(), SettingsCfg::default());
        let contract = ContractInfo::new(ContractKind::LabeledField, "eth", "0xabc");
        let report = d.run(&signal(Some(contract)));

        assert_eq!(report, ActionReport { copied: true, opened: true, notified: true, beeped: false });
        assert_eq!(recorder.copied.lock().unwrap().as_slice(), ["MEXC:DEXEUSDT.p"]);
        assert_eq!(recorder.opened.lock().unwrap().as_slice(), ["https://gmgn.ai/eth/token/0xabc"]);
    }

    #[test]
    fn toggles_and_failures_are_respected() {
        let recorder = Arc::new(Recorder { fail: true, ..Default::default() });
        let settings = SettingsCfg { auto_open_gmgn: false, ..Default::default() };
        let d = dispatcher(recorder.clone(), settings);
        let contract = ContractInfo::new(ContractKind::ExplorerLink, "eth", "0xabc");
        let report = d.run(&signal(Some(contract)));

        assert!(!report.copied);
        assert!(!report.opened);
        assert!(recorder.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn desktop_and_sound_are_independent() {
        let recorder = Arc::new(Recorder::default());
        let sound_only = NotificationsCfg { enabled: true, desktop: false, sound: true };
        let report = with_notifications(recorder.clone(), SettingsCfg::default(), sound_only).run(&signal(None));
        assert!(!report.notified);
        assert!(report.beeped);
        assert!(recorder.notified.lock().unwrap().is_empty());
        assert_eq!(*recorder.beeps.lock().unwrap(), 1);

        let recorder = Arc::new(Recorder::default());
        let desktop_only = NotificationsCfg { enabled: true, desktop: true, sound: false };
        let report = with_notifications(recorder.clone(), SettingsCfg::default(), desktop_only).run(&signal(None));
        assert!(report.notified);
        assert!(!report.beeped);
        assert_eq!(
            recorder.notified.lock().unwrap().as_slice(),
            ["New ticker from @mexcTracker: DEXE -> MEXC:DEXEUSDT.p"]
        );
        assert_eq!(*recorder.beeps.lock().unwrap(), 0);
    }
}
