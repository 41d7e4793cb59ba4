//! Build switches read from a free-form command line.

use unrealscript_compiler::CompileOptions;
use unrealscript_headers::{AutoAccept, AutoDecline, Prompter};

/// Switches that gate driver behavior. Every switch is off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Rebuild every package and delete stale headers.
    pub full: bool,
    /// Log functions no compiled code calls.
    pub list_unreferenced: bool,
    /// Skip the native size conformance check.
    pub no_conform: bool,
    /// Keep stale headers on a full build.
    pub no_delete: bool,
    /// Accept every prompt.
    pub auto: bool,
    /// Emit debug-info opcodes.
    pub debug: bool,
    /// Non-interactive, quieter build.
    pub silent: bool,
    /// Log the class compile order.
    pub show_dep: bool,
    /// Any class failure aborts the whole batch.
    pub bootstrap: bool,
}

impl BuildOptions {
    /// Parse switches out of a command line. Matching ignores case and a
    /// leading `-` or `/`; unknown words are ignored.
    pub fn parse(command_line: &str) -> Self {
        let mut options = Self::default();
        for word in command_line.split_whitespace() {
            let switch = word.trim_start_matches(['-', '/']).to_ascii_lowercase();
            match switch.as_str() {
                "full" => options.full = true,
                "listunreferenced" => options.list_unreferenced = true,
                "noconform" => options.no_conform = true,
                "nodelete" => options.no_delete = true,
                "auto" => options.auto = true,
                "debug" => options.debug = true,
                "silentbuild" => options.silent = true,
                "showdep" => options.show_dep = true,
                "bootstrap" => options.bootstrap = true,
                _ => {}
            }
        }
        options
    }

    /// The switches the compiler itself consumes.
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            debug_info: self.debug,
            list_unreferenced: self.list_unreferenced,
            no_conform: self.no_conform,
        }
    }

    /// Whether stale headers are removed after export.
    pub fn delete_stale_headers(&self) -> bool {
        self.full && !self.no_delete
    }

    /// The prompter implied by the switches, or `None` when the build is
    /// interactive and the caller must ask.
    pub fn fixed_prompter(&self) -> Option<Box<dyn Prompter>> {
        if self.auto {
            Some(Box::new(AutoAccept))
        } else if self.silent {
            Some(Box::new(AutoDecline))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switches_ignore_case_and_prefix() {
        let options = BuildOptions::parse("make -FULL /nodelete ListUnreferenced SHOWDEP");
        assert!(options.full);
        assert!(options.no_delete);
        assert!(options.list_unreferenced);
        assert!(options.show_dep);
        assert!(!options.auto);
        assert!(!options.delete_stale_headers());
    }

    #[test]
    fn unknown_words_are_ignored() {
        assert_eq!(BuildOptions::parse("make Engine -fullish"), BuildOptions::default());
    }

    #[test]
    fn compile_options_follow_switches() {
        let options = BuildOptions::parse("-debug -noconform");
        assert_eq!(
            options.compile_options(),
            CompileOptions {
                debug_info: true,
                list_unreferenced: false,
                no_conform: true,
            }
        );
    }

    #[test]
    fn auto_wins_over_silent() {
        let mut both = BuildOptions::parse("-auto -silentbuild");
        let mut prompter = both.fixed_prompter().expect("non-interactive");
        assert!(prompter.confirm("overwrite?"));

        both.auto = false;
        let mut prompter = both.fixed_prompter().expect("non-interactive");
        assert!(!prompter.confirm("overwrite?"));

        assert!(BuildOptions::default().fixed_prompter().is_none());
    }
}
