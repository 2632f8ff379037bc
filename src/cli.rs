//! Command-line interface definitions for News Scout.
//!
//! API keys can be given as flags but are normally read from the
//! environment.

use clap::Parser;
use std::path::PathBuf;

/// Find recent news about a company and rank it by business opportunity.
///
/// # Examples
///
/// ```sh
/// # Search term
/// news_scout "Snowflake" -n 10
///
/// # Company website; the brand name is inferred from the page
/// news_scout https://www.snowflake.com
///
/// # Custom settings and output directory
/// news_scout "Snowflake" -c ./news_scout.yaml -r ./out
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Company website URL or search term
    pub query: String,

    /// Number of articles to retrieve (1-100)
    #[arg(short, long, default_value_t = 25, value_parser = clap::value_parser!(u16).range(1..=100))]
    pub num_articles: u16,

    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory for the JSON, CSV and log files
    #[arg(short, long, default_value = "results")]
    pub results_dir: PathBuf,

    /// OpenAI API key; without it articles are scored heuristically
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// NewsAPI key
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true)]
    pub newsapi_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "news_scout",
            "https://www.snowflake.com",
            "--num-articles",
            "10",
            "--results-dir",
            "./out",
        ]);

        assert_eq!(cli.query, "https://www.snowflake.com");
        assert_eq!(cli.num_articles, 10);
        assert_eq!(cli.results_dir, PathBuf::from("./out"));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_short_flags_and_defaults() {
        let cli = Cli::parse_from(["news_scout", "Snowflake", "-c", "/tmp/scout.yaml"]);

        assert_eq!(cli.num_articles, 25);
        assert_eq!(cli.results_dir, PathBuf::from("results"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/scout.yaml")));
    }

    #[test]
    fn test_cli_rejects_out_of_range_count() {
        assert!(Cli::try_parse_from(["news_scout", "Snowflake", "-n", "0"]).is_err());
        assert!(Cli::try_parse_from(["news_scout", "Snowflake", "-n", "101"]).is_err());
        assert!(Cli::try_parse_from(["news_scout", "Snowflake", "-n", "100"]).is_ok());
    }

    #[test]
    fn test_cli_requires_query() {
        assert!(Cli::try_parse_from(["news_scout"]).is_err());
    }
}
