#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use cube_config::EmitMode;

    use crate::cli::{Cli, Command, Emit};

    #[test]
    fn build_defaults() {
        let cli = Cli::parse_from(["cube", "build"]);
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert!(args.root.is_none());
        assert!(args.dest.is_none());
        assert!(!args.smart);
        assert!(args.export_modules.is_empty());
    }

    #[test]
    fn smart_build_with_all_options() {
        let cli = Cli::parse_from([
            "cube",
            "build",
            "app",
            "-o",
            "dist",
            "--smart",
            "--emit",
            "bundles",
            "--export",
            "/lib/a.js",
            "--export",
            "/lib/b.js",
            "--concurrency",
            "4",
        ]);
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.root, Some(PathBuf::from("app")));
        assert_eq!(args.dest, Some(PathBuf::from("dist")));
        assert!(args.smart);
        assert_eq!(args.emit, Some(Emit::Bundles));
        assert_eq!(args.export_modules, vec!["/lib/a.js", "/lib/b.js"]);
        assert_eq!(args.concurrency, Some(4));
    }

    #[test]
    fn emit_requires_smart() {
        assert!(Cli::try_parse_from(["cube", "build", "--emit", "bundles"]).is_err());
    }

    #[test]
    fn verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["cube", "-v", "-q", "check"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["cube", "check", "--no-color", "--verbose"]);
        assert!(cli.no_color);
        assert!(cli.verbose);
    }

    #[test]
    fn bundle_args() {
        let cli = Cli::parse_from(["cube", "bundle", "/src/app.js", "--ignore-first-code-wrap"]);
        let Command::Bundle(args) = cli.command else {
            panic!("expected bundle");
        };
        assert_eq!(args.entry, "/src/app.js");
        assert!(args.ignore_first_code_wrap);
        assert!(args.output.is_none());
    }

    #[test]
    fn emit_converts_to_config_mode() {
        assert_eq!(EmitMode::from(Emit::Modules), EmitMode::Modules);
        assert_eq!(EmitMode::from(Emit::Bundles), EmitMode::Bundles);
    }
}
