//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use bibgen_core::{ConfigOverrides, LibraryType, SortField};

/// Generate an HTML bibliography from a Zotero library.
///
/// Collections become nested sections; the items of each leaf collection
/// are rendered as citations in the chosen CSL style. Options given here
/// override the settings file.
#[derive(Parser, Debug)]
#[command(name = "bibgen")]
#[command(author, version, about)]
pub struct Args {
    /// Zotero library id
    #[arg(short = 'l', long)]
    pub library_id: Option<u64>,

    /// Zotero library type
    #[arg(short = 't', long, value_enum)]
    pub library_type: Option<LibraryType>,

    /// Zotero API key (needed for private and group libraries)
    #[arg(short = 'a', long, env = "ZOTERO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Field to sort items by
    #[arg(short = 's', long, value_enum)]
    pub sort: Option<SortField>,

    /// Key of the collection whose sub-collections become the roots
    #[arg(short = 'c', long)]
    pub top_collection: Option<String>,

    /// CSL style name, e.g. chicago-author-date
    #[arg(short = 'S', long)]
    pub citation_style: Option<String>,

    /// Directory holding <style>.csl files
    #[arg(short = 'd', long, value_name = "DIR")]
    pub styles_dir: Option<PathBuf>,

    /// Repository missing styles are downloaded from
    #[arg(long, value_name = "URL")]
    pub styles_url: Option<String>,

    /// Settings file (default: $XDG_CONFIG_HOME/bibgen/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Template replacing the built-in HTML template
    #[arg(long, value_name = "FILE")]
    pub template: Option<PathBuf>,

    /// Write the document to FILE instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the library's last modified version and exit
    #[arg(long)]
    pub version_only: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// The configuration options given on the command line.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            library_id: self.library_id,
            library_type: self.library_type,
            api_key: self.api_key.clone(),
            sort: self.sort,
            top_collection: self.top_collection.clone(),
            citation_style: self.citation_style.clone(),
            styles_dir: self.styles_dir.clone(),
            remote_styles_url: self.styles_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["bibgen"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(!args.version_only);
        assert!(args.library_id.is_none());
        assert!(args.output.is_none());
    }

    #[test]
    fn test_cli_library_short_flags() {
        let args = Args::try_parse_from(["bibgen", "-l", "12345", "-t", "group"]).unwrap();
        assert_eq!(args.library_id, Some(12345));
        assert_eq!(args.library_type, Some(LibraryType::Group));
    }

    #[test]
    fn test_cli_library_long_flags() {
        let args = Args::try_parse_from([
            "bibgen",
            "--library-id",
            "7",
            "--library-type",
            "user",
            "--top-collection",
            "ABCD2345",
        ])
        .unwrap();
        assert_eq!(args.library_id, Some(7));
        assert_eq!(args.library_type, Some(LibraryType::User));
        assert_eq!(args.top_collection.as_deref(), Some("ABCD2345"));
    }

    #[test]
    fn test_cli_invalid_library_type_rejected() {
        let result = Args::try_parse_from(["bibgen", "-t", "team"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::InvalidValue
        );
    }

    #[test]
    fn test_cli_non_numeric_library_id_rejected() {
        let result = Args::try_parse_from(["bibgen", "-l", "abc"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_sort_uses_api_field_names() {
        let args = Args::try_parse_from(["bibgen", "-s", "dateAdded"]).unwrap();
        assert_eq!(args.sort, Some(SortField::DateAdded));

        let args = Args::try_parse_from(["bibgen", "--sort", "publicationTitle"]).unwrap();
        assert_eq!(args.sort, Some(SortField::PublicationTitle));

        assert!(Args::try_parse_from(["bibgen", "-s", "relevance"]).is_err());
    }

    #[test]
    fn test_cli_style_flags() {
        let args = Args::try_parse_from([
            "bibgen",
            "-S",
            "apa",
            "-d",
            "/srv/styles",
            "--styles-url",
            "https://example.org/styles",
        ])
        .unwrap();
        assert_eq!(args.citation_style.as_deref(), Some("apa"));
        assert_eq!(args.styles_dir, Some(PathBuf::from("/srv/styles")));
        assert_eq!(args.styles_url.as_deref(), Some("https://example.org/styles"));
    }

    #[test]
    fn test_cli_output_and_template_flags() {
        let args =
            Args::try_parse_from(["bibgen", "-o", "out.html", "--template", "t.html"]).unwrap();
        assert_eq!(args.output, Some(PathBuf::from("out.html")));
        assert_eq!(args.template, Some(PathBuf::from("t.html")));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["bibgen", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["bibgen", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["bibgen", "-q"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["bibgen", "--help"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayHelp
        );
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let result = Args::try_parse_from(["bibgen", "--version"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayVersion
        );
    }

    #[test]
    fn test_cli_overrides_carry_only_given_flags() {
        let args = Args::try_parse_from(["bibgen", "-l", "1", "-S", "apa"]).unwrap();
        let overrides = args.overrides();
        assert_eq!(overrides.library_id, Some(1));
        assert_eq!(overrides.citation_style.as_deref(), Some("apa"));
        assert!(overrides.library_type.is_none());
        assert!(overrides.remote_styles_url.is_none());
    }
}
