use crate::types::{Report, VerificationOutcome};
use colored::Colorize;

/// Renders a verification report as human-readable text
pub struct ReportRenderer {
    show_colors: bool,
    show_details: bool,
}

impl ReportRenderer {
    pub fn new(show_colors: bool) -> Self {
        Self {
            show_colors,
            show_details: false,
        }
    }

    /// Also list every diagnostic after the summary
    pub fn with_details(mut self, show_details: bool) -> Self {
        self.show_details = show_details;
        self
    }

    /// Print the report to stdout
    pub fn render(&self, report: &Report) {
        println!("{}", self.format(report));
    }

    /// Format the report as three sections: verified, unverified, errors
    pub fn format(&self, report: &Report) -> String {
        let mut sections = vec![
            self.format_packages(&report.verified, Section::Verified),
            self.format_packages(&report.unverified, Section::Unverified),
            self.format_list(&report.errors, Section::Errors),
        ];

        if self.show_details && !report.details.is_empty() {
            sections.push(self.format_list(&report.details, Section::Details));
        }

        sections.join("\n")
    }

    fn format_packages(&self, outcomes: &[VerificationOutcome], section: Section) -> String {
        let names: Vec<String> = outcomes
            .iter()
            .map(|o| o.declaration.name().to_string())
            .collect();
        self.format_list(&names, section)
    }

    fn format_list(&self, items: &[String], section: Section) -> String {
        if items.is_empty() {
            return section.empty_message().to_string();
        }

        let header = section.header(items.len());
        let header = if self.show_colors {
            match section {
                Section::Verified => header.green().to_string(),
                Section::Unverified => header.red().to_string(),
                Section::Errors => header.yellow().to_string(),
                Section::Details => header.dimmed().to_string(),
            }
        } else {
            header
        };

        match section {
            Section::Details | Section::Errors => {
                let lines: Vec<String> = items.iter().map(|i| format!("  {i}")).collect();
                format!("{header}\n{}", lines.join("\n"))
            }
            Section::Verified | Section::Unverified => {
                format!("{header}\n  {}", items.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Section {
    Verified,
    Unverified,
    Errors,
    Details,
}

impl Section {
    fn empty_message(self) -> &'static str {
        match self {
            Section::Verified => "No verified packages.",
            Section::Unverified => "No unverified packages.",
            Section::Errors => "No processing errors.",
            Section::Details => "No details.",
        }
    }

    fn header(self, count: usize) -> String {
        match self {
            Section::Verified => format!("Verified {count} package(s):"),
            Section::Unverified => format!("Could not verify {count} package(s):"),
            Section::Errors => format!("Encountered {count} processing error(s):"),
            Section::Details => "Details:".to_string(),
        }
    }
}
