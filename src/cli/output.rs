//! Output formatting for JSON, YAML and human-readable text

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::DerivekitConfig;
use crate::glob::ScopeSplit;
use crate::prefetch::BuildDiagnostics;
use crate::preset::{CompiledOptions, Entry};
use crate::rules::RuleRecord;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format (version-control friendly)
    Yaml,
    Human,
}

#[derive(Debug, Serialize)]
struct SplitReport<'a> {
    pattern: &'a str,
    global: bool,
    scope: &'a str,
    local_pattern: &'a str,
}

#[derive(Debug, Serialize)]
struct PrefetchReport<'a> {
    outcomes: &'a [crate::prefetch::DiscoveryOutcome],
    errors: Vec<String>,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_compiled(&self, options: &CompiledOptions) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.to_json(options, "compiled options"),
            OutputFormat::Yaml => self.to_yaml(options, "compiled options"),
            OutputFormat::Human => Ok(self.format_compiled_human(options)),
        }
    }

    pub fn format_split(&self, split: &ScopeSplit) -> Result<String> {
        let report = SplitReport {
            pattern: split.predicate.pattern(),
            global: split.predicate.is_global(),
            scope: &split.scope,
            local_pattern: &split.local_pattern,
        };
        match self.format {
            OutputFormat::Json => self.to_json(&report, "split result"),
            OutputFormat::Yaml => self.to_yaml(&report, "split result"),
            OutputFormat::Human => Ok(format!(
                "Pattern:  {}{}\nScope:    {}\nLocal:    {}\n",
                report.pattern,
                if report.global { " (global)" } else { "" },
                display_or(report.scope, "(context root)"),
                display_or(report.local_pattern, "(none)"),
            )),
        }
    }

    pub fn format_prefetch(&self, diagnostics: &BuildDiagnostics) -> Result<String> {
        let report = PrefetchReport {
            outcomes: &diagnostics.outcomes,
            errors: diagnostics.errors.iter().map(|e| e.to_string()).collect(),
        };
        match self.format {
            OutputFormat::Json => self.to_json(&report, "prefetch result"),
            OutputFormat::Yaml => self.to_yaml(&report, "prefetch result"),
            OutputFormat::Human => Ok(self.format_prefetch_human(&report)),
        }
    }

    pub fn format_config(&self, config: &DerivekitConfig) -> Result<String> {
        let map = config.to_display_map();
        match self.format {
            OutputFormat::Json => self.to_json(&map, "config"),
            OutputFormat::Yaml => self.to_yaml(&map, "config"),
            OutputFormat::Human => Ok(config.to_string()),
        }
    }

    fn to_json<T: Serialize + ?Sized>(&self, value: &T, what: &str) -> Result<String> {
        serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {} to JSON", what))
    }

    fn to_yaml<T: Serialize + ?Sized>(&self, value: &T, what: &str) -> Result<String> {
        serde_yaml::to_string(value).with_context(|| format!("Failed to serialize {} to YAML", what))
    }

    fn format_compiled_human(&self, options: &CompiledOptions) -> String {
        let mut output = String::new();

        output.push_str("Compiled Options\n");
        output.push_str(RULE);
        output.push_str("\n\n");

        output.push_str(&format!("Context:  {}\n", options.context.display()));
        output.push_str(&format!("Output:   {}\n", options.output.path.display()));
        output.push_str(&format!(
            "Devtool:  {}\n",
            options.devtool.as_deref().unwrap_or("(none)")
        ));
        output.push_str(&format!("Plugins:  {}\n\n", options.plugins.len()));

        output.push_str("Entry:\n");
        match &options.entry {
            Entry::List(points) if points.is_empty() => output.push_str("\u{2514}\u{2500} (none)\n"),
            Entry::List(points) => push_tree(&mut output, points.iter().cloned()),
            Entry::Named(named) => push_tree(
                &mut output,
                named
                    .iter()
                    .map(|(name, points)| format!("{}: {}", name, points.join(", "))),
            ),
        }

        push_rules(&mut output, "Loaders", &options.module.loaders);
        push_rules(&mut output, "Pre-loaders", &options.module.pre_loaders);

        if !options.prefetch.is_empty() {
            output.push_str("\nPrefetch:\n");
            push_tree(
                &mut output,
                options.prefetch.iter().map(|p| {
                    format!(
                        "{}  {}  \u{2192} {}",
                        p.scope.display(),
                        p.predicate,
                        p.stage_chain.request()
                    )
                }),
            );
        }

        output
    }

    fn format_prefetch_human(&self, report: &PrefetchReport<'_>) -> String {
        let mut output = String::new();

        let symbol = if report.errors.is_empty() {
            "\u{2713}"
        } else {
            "\u{2717}"
        };
        output.push_str(&format!("{} Prefetch\n", symbol));
        output.push_str(RULE);
        output.push_str("\n\n");

        for outcome in report.outcomes {
            output.push_str(&format!(
                "{} ({} file(s))\n",
                outcome.scope.display(),
                outcome.files.len()
            ));
            push_tree(&mut output, outcome.files.iter().map(|f| f.request.clone()));
            output.push('\n');
        }

        if !report.errors.is_empty() {
            output.push_str("Errors:\n");
            for error in &report.errors {
                output.push_str(&format!("  - {}\n", error));
            }
        }

        output
    }
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() {
        fallback
    } else {
        value
    }
}

fn push_rules(output: &mut String, title: &str, rules: &[RuleRecord]) {
    output.push_str(&format!("\n{}:\n", title));
    if rules.is_empty() {
        output.push_str("\u{2514}\u{2500} (none)\n");
        return;
    }
    push_tree(
        output,
        rules.iter().map(|rule| {
            format!(
                "{}{}  \u{2192} {}",
                rule.pattern,
                if rule.is_global() { " (global)" } else { "" },
                rule.request()
            )
        }),
    );
}

fn push_tree(output: &mut String, lines: impl ExactSizeIterator<Item = String>) {
    let count = lines.len();
    for (i, line) in lines.enumerate() {
        let connector = if i + 1 == count { "\u{2514}" } else { "\u{251C}" };
        output.push_str(&format!("{}\u{2500} {}\n", connector, line));
    }
}
