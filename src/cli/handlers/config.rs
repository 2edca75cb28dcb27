use crate::cli::OutputFormatter;
use crate::config::Config;
use crate::error::Result;

/// Prints the effective configuration
pub fn handle_config_show(config: &Config, output: &OutputFormatter) -> Result<()> {
    if output.is_json() {
        output.print_json(config)
    } else {
        output.info(config.to_yaml()?.trim_end());
        Ok(())
    }
}
