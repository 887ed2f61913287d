//! List command: print sources in grid order.

use streamgrid_core::StreamSource;

use crate::cli::ListArgs;
use crate::commands::utils;
use crate::config::{AppConfig, ConfigOverrides};
use crate::error::Result;
use crate::ui;

/// Execute the list command.
pub async fn execute(args: ListArgs, overrides: ConfigOverrides) -> Result<()> {
    let config = AppConfig::load(&overrides)?;
    let store = utils::open_store(&config)?;
    let sources = store.sources();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }

    if sources.is_empty() {
        ui::info("No sources yet. Add one with 'streamgrid add <URL>'");
        return Ok(());
    }
    for line in format_rows(&sources) {
        println!("{line}");
    }
    Ok(())
}

/// One aligned `index  id  platform  originalUrl` line per source.
fn format_rows(sources: &[StreamSource]) -> Vec<String> {
    let id_width = sources.iter().map(|s| s.id.len()).max().unwrap_or(0);
    sources
        .iter()
        .enumerate()
        .map(|(index, source)| {
            format!(
                "{:>3}  {:<id_width$}  {:<9}  {}",
                index,
                source.id,
                source.platform.as_str(),
                source.original_url,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use streamgrid_core::Platform;

    fn source(id: &str, platform: Platform) -> StreamSource {
        StreamSource {
            id: id.to_string(),
            platform,
            embed_url: String::new(),
            original_url: format!("https://example.com/{id}"),
            added_at: 0,
        }
    }

    #[test]
    fn test_rows_are_aligned() {
        let rows = format_rows(&[
            source("vimeo:1", Platform::Vimeo),
            source("twitch:longchannelname", Platform::Twitch),
        ]);

        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("  0  vimeo:1 "));
        assert!(rows[1].starts_with("  1  twitch:longchannelname  twitch"));
        // URL column starts at the same offset on every row
        let offset = |row: &str| row.find("https://").unwrap();
        assert_eq!(offset(&rows[0]), offset(&rows[1]));
    }
}
