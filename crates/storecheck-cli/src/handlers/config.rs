//! Config command handler

use crate::config::CliConfig;
use crate::error::CliResult;

/// Effective configuration as pretty JSON
pub fn render_config(config: &CliConfig) -> CliResult<String> {
    Ok(serde_json::to_string_pretty(config)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::Verbosity;
    use storecheck::RunConfig;

    #[test]
    fn test_render_includes_run_settings() {
        let config = CliConfig::new()
            .with_verbosity(Verbosity::Verbose)
            .with_run(RunConfig::default().with_headless(false));
        let json: serde_json::Value = serde_json::from_str(&render_config(&config).unwrap()).unwrap();
        assert_eq!(json["verbosity"], "Verbose");
        assert_eq!(json["run"]["headless"], false);
        assert_eq!(json["run"]["base_url"], "https://demo.opencart.com");
    }
}
