use focus_watch::config::WindowConfig;
use std::time::Duration;
use tracing::{info, warn};

/// Substitutes `{url}` in the configured launch arguments.
pub fn companion_args(args: &[String], url: &str) -> Vec<String> {
    args.iter().map(|a| a.replace("{url}", url)).collect()
}

/// One-time startup side effect: opens the dashboard as a borderless app
/// window once the server has had time to bind. Failure is logged only.
pub async fn launch_companion(cfg: WindowConfig, url: String) {
    let Some(command) = cfg.launch_command.clone() else {
        info!("no companion command configured, open {} manually", url);
        return;
    };
    tokio::time::sleep(Duration::from_millis(cfg.launch_delay_ms)).await;

    let args = companion_args(&cfg.launch_args, &url);
    match tokio::process::Command::new(&command).args(&args).spawn() {
        Ok(_) => info!(%command, "companion window launched"),
        Err(e) => warn!(%command, error = %e, "could not launch companion window"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_placeholder_is_replaced_everywhere() {
        let args = vec![
            "--app={url}".to_string(),
            "--new-window".to_string(),
            "{url}".to_string(),
        ];
        assert_eq!(
            companion_args(&args, "http://127.0.0.1:5000"),
            vec![
                "--app=http://127.0.0.1:5000",
                "--new-window",
                "http://127.0.0.1:5000"
            ]
        );
    }

    #[tokio::test]
    async fn missing_program_is_not_fatal() {
        let cfg = WindowConfig {
            launch_command: Some("focus-watch-no-such-browser".to_string()),
            launch_delay_ms: 0,
            ..WindowConfig::default()
        };
        launch_companion(cfg, "http://127.0.0.1:5000".to_string()).await;
    }
}
