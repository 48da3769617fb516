//! Structural checks for the Verilog rendition of the processor.
//!
//! The hardware is meant to be built bottom-up from its own gates: the
//! XOR gate from AND/OR/NOT, the full adder from that XOR, the 4-bit adder
//! from four full adders and the ALU from the adder plus XOR gates. The
//! checker scans an RTL directory for violations of that hierarchy and for
//! register-style problems in the clocked modules.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use regex::{Captures, Regex};
use serde::Serialize;
use thiserror::Error;

/// Combinational modules. Each one must be present.
pub const STRUCTURAL_FILES: [&str; 4] = ["xor_1b.v", "fa_1b.v", "adder_4b.v", "alu_4b.v"];

/// Clocked modules. Checked when present, skipped otherwise.
pub const SEQUENTIAL_FILES: [&str; 3] = ["alu_reg_4b.v", "decoder_fsm.v", "ram16x4_sync.v"];

/// How bad a finding is. Only errors fail a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Error,
    Warning,
}

/// A single problem found in an RTL file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub file: String,
    /// 1-based line, for line-oriented checks.
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.file, line, self.message),
            None => write!(f, "{}: {}", self.file, self.message),
        }
    }
}

/// Outcome of a full check run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn errors(&self) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> + '_ {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }

    /// Check if the run produced no errors. Warnings do not count.
    pub fn passed(&self) -> bool {
        self.errors().next().is_none()
    }

    fn error(&mut self, file: &str, message: impl Into<String>) {
        self.push(Severity::Error, file, None, message.into());
    }

    fn warning(&mut self, file: &str, line: Option<usize>, message: impl Into<String>) {
        self.push(Severity::Warning, file, line, message.into());
    }

    fn push(&mut self, severity: Severity, file: &str, line: Option<usize>, message: String) {
        self.findings.push(Finding {
            severity,
            file: file.to_string(),
            line,
            message,
        });
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors: Vec<_> = self.errors().collect();
        let warnings: Vec<_> = self.warnings().collect();

        if errors.is_empty() {
            writeln!(f, "No errors found")?;
        } else {
            writeln!(f, "ERRORS ({}):", errors.len())?;
            for e in errors {
                writeln!(f, "  - {e}")?;
            }
        }
        if !warnings.is_empty() {
            writeln!(f, "WARNINGS ({}):", warnings.len())?;
            for w in warnings {
                writeln!(f, "  - {w}")?;
            }
        }
        Ok(())
    }
}

/// Errors that stop a check run before it starts.
#[derive(Debug, Error)]
pub enum LintError {
    #[error("RTL directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid check pattern: {0}")]
    Pattern(#[from] regex::Error),
}

struct Patterns {
    block_comment: Regex,
    line_comment: Regex,
    xor_inst: Regex,
    fa_inst: Regex,
    adder_inst: Regex,
    assign_plus: Regex,
    clocked_always: Regex,
    block_start: Regex,
    end_module: Regex,
    reset_branch: Regex,
    end_else: Regex,
    blocking: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            block_comment: Regex::new(r"(?s)/\*.*?\*/")?,
            line_comment: Regex::new(r"//.*")?,
            xor_inst: instance_pattern("xor_1b")?,
            fa_inst: instance_pattern("fa_1b")?,
            adder_inst: instance_pattern("adder_4b")?,
            assign_plus: Regex::new(r"assign\s+\w+\s*=.*\+")?,
            clocked_always: Regex::new(r"always\s*@\s*\(\s*posedge\s+clk\s+or\s+negedge\s+reset_n")?,
            block_start: Regex::new(r"\b(always|assign)\b")?,
            end_module: Regex::new(r"\bendmodule\b")?,
            reset_branch: Regex::new(r"if\s*\(\s*!\s*reset_n")?,
            end_else: Regex::new(r"end\s+else")?,
            // `=` not followed by another `=`; `<=`, `>=` and `!=` never
            // have a word character directly before the `=`.
            blocking: Regex::new(r"\w+\s*=([^=]|$)")?,
        })
    }

    /// Remove comments. Block comments keep their newlines so line
    /// numbers stay valid.
    fn strip_comments(&self, text: &str) -> String {
        let no_block = self
            .block_comment
            .replace_all(text, |caps: &Captures| "\n".repeat(caps[0].matches('\n').count()));
        self.line_comment.replace_all(&no_block, "").into_owned()
    }
}

fn instance_pattern(module: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(r"\b{}\s+\w+", regex::escape(module)))
}

/// Scans a set of RTL sources.
pub struct RtlChecker {
    /// Comment-stripped sources, keyed by file name.
    sources: BTreeMap<String, String>,
    patterns: Patterns,
}

impl RtlChecker {
    /// Load every known module present in `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, LintError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(LintError::DirectoryNotFound(dir.to_path_buf()));
        }

        let mut loaded = Vec::new();
        for name in STRUCTURAL_FILES.iter().chain(SEQUENTIAL_FILES.iter()) {
            let path = dir.join(name);
            if !path.is_file() {
                tracing::debug!(file = *name, "not present");
                continue;
            }
            let text = std::fs::read_to_string(&path)
                .map_err(|source| LintError::Io { path: path.clone(), source })?;
            loaded.push((name.to_string(), text));
        }

        Self::from_sources(loaded)
    }

    /// Build a checker over in-memory sources.
    pub fn from_sources<N, S>(sources: impl IntoIterator<Item = (N, S)>) -> Result<Self, LintError>
    where
        N: Into<String>,
        S: AsRef<str>,
    {
        let patterns = Patterns::compile()?;
        let sources = sources
            .into_iter()
            .map(|(name, text)| (name.into(), patterns.strip_comments(text.as_ref())))
            .collect();
        Ok(Self { sources, patterns })
    }

    /// Run every check.
    pub fn run(&self) -> Report {
        let mut report = Report::default();

        for name in STRUCTURAL_FILES {
            if !self.sources.contains_key(name) {
                report.error(name, "file not found");
            }
        }

        self.check_xor(&mut report);
        self.check_full_adder(&mut report);
        self.check_adder(&mut report);
        self.check_alu(&mut report);
        for name in SEQUENTIAL_FILES {
            self.check_sequential(name, &mut report);
        }

        tracing::info!(
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            "RTL check finished"
        );
        report
    }

    fn source(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(String::as_str)
    }

    fn forbid(&self, name: &str, tokens: &[&str], report: &mut Report) {
        let Some(text) = self.source(name) else { return };
        for token in tokens {
            if text.contains(token) {
                report.error(name, format!("found forbidden token '{token}'"));
            }
        }
    }

    fn require(&self, name: &str, module: &str, pattern: &Regex, report: &mut Report) -> usize {
        let Some(text) = self.source(name) else { return 0 };
        let count = pattern.find_iter(text).count();
        if count == 0 {
            report.error(name, format!("missing required instantiation of '{module}'"));
        }
        count
    }

    fn check_xor(&self, report: &mut Report) {
        self.forbid("xor_1b.v", &["^", "xnor"], report);
    }

    fn check_full_adder(&self, report: &mut Report) {
        self.require("fa_1b.v", "xor_1b", &self.patterns.xor_inst, report);
        self.forbid("fa_1b.v", &["^"], report);
    }

    fn check_adder(&self, report: &mut Report) {
        let name = "adder_4b.v";
        let count = self.require(name, "fa_1b", &self.patterns.fa_inst, report);
        if count != 0 && count != 4 {
            report.error(name, format!("expected 4 fa_1b instances, found {count}"));
        }
        if let Some(text) = self.source(name) {
            if self.patterns.assign_plus.is_match(text) {
                report.error(
                    name,
                    "found '+' operator in assign statement (structural adder required)",
                );
            }
        }
    }

    fn check_alu(&self, report: &mut Report) {
        let name = "alu_4b.v";
        self.require(name, "adder_4b", &self.patterns.adder_inst, report);
        let xors = self.require(name, "xor_1b", &self.patterns.xor_inst, report);
        if xors != 0 && xors < 4 {
            report.warning(
                name,
                None,
                format!("expected 4 xor_1b instances for XOR operation, found {xors}"),
            );
        }
    }

    /// Flag non-blocking assignments in an async reset branch and blocking
    /// assignments in the clocked branch.
    fn check_sequential(&self, name: &str, report: &mut Report) {
        let Some(text) = self.source(name) else {
            return;
        };
        let p = &self.patterns;
        let mut in_clocked = false;
        let mut in_reset = false;

        for (i, line) in text.lines().enumerate() {
            let line_num = i + 1;

            if p.clocked_always.is_match(line) {
                in_clocked = true;
                in_reset = false;
            } else if p.block_start.is_match(line) || p.end_module.is_match(line) {
                in_clocked = false;
                in_reset = false;
            }
            if in_clocked && p.reset_branch.is_match(line) {
                in_reset = true;
            }
            if in_reset && p.end_else.is_match(line) {
                in_reset = false;
            }

            if !in_clocked || !line.contains('=') {
                continue;
            }
            let non_blocking = line.contains("<=");
            if in_reset && non_blocking {
                report.warning(
                    name,
                    Some(line_num),
                    "non-blocking assignment in reset branch (blocking '=' recommended)",
                );
            } else if !in_reset && !non_blocking && p.blocking.is_match(line) {
                report.warning(
                    name,
                    Some(line_num),
                    "blocking assignment in clocked branch (non-blocking '<=' recommended)",
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XOR: &str = r#"
module xor_1b(input a, input b, output y);
    wire na, nb;
    // y = a ^ b, built from primitives
    assign na = ~a;
    assign nb = ~b;
    assign y = (a & nb) | (na & b);
endmodule
"#;

    const FA: &str = r#"
module fa_1b(input a, input b, input cin, output sum, output cout);
    wire t;
    xor_1b x0(.a(a), .b(b), .y(t));
    xor_1b x1(.a(t), .b(cin), .y(sum));
    assign cout = (a & b) | (t & cin);
endmodule
"#;

    const ADDER: &str = r#"
module adder_4b(input [3:0] a, input [3:0] b, input cin, output [3:0] s, output cout);
    wire c1, c2, c3;
    fa_1b f0(a[0], b[0], cin, s[0], c1);
    fa_1b f1(a[1], b[1], c1, s[1], c2);
    fa_1b f2(a[2], b[2], c2, s[2], c3);
    fa_1b f3(a[3], b[3], c3, s[3], cout);
endmodule
"#;

    const ALU: &str = r#"
module alu_4b(input [3:0] a, input [3:0] b, input [2:0] sel, output [3:0] y);
    adder_4b add0(a, b, 1'b0, sum, c);
    xor_1b x0(a[0], b[0], x[0]);
    xor_1b x1(a[1], b[1], x[1]);
    xor_1b x2(a[2], b[2], x[2]);
    xor_1b x3(a[3], b[3], x[3]);
endmodule
"#;

    fn checker(files: &[(&str, &str)]) -> RtlChecker {
        RtlChecker::from_sources(files.iter().copied()).unwrap()
    }

    fn good() -> Vec<(&'static str, &'static str)> {
        vec![
            ("xor_1b.v", XOR),
            ("fa_1b.v", FA),
            ("adder_4b.v", ADDER),
            ("alu_4b.v", ALU),
        ]
    }

    fn with(name: &'static str, text: &'static str) -> Vec<(&'static str, &'static str)> {
        let mut files = good();
        for f in &mut files {
            if f.0 == name {
                f.1 = text;
            }
        }
        if !files.iter().any(|f| f.0 == name) {
            files.push((name, text));
        }
        files
    }

    fn messages(report: &Report) -> Vec<String> {
        report.findings.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_clean_hierarchy_passes() {
        let report = checker(&good()).run();
        assert!(report.passed(), "{report}");
        assert!(report.findings.is_empty(), "{report}");
    }

    #[test]
    fn test_missing_structural_file_is_error() {
        let files: Vec<_> = good().into_iter().filter(|f| f.0 != "fa_1b.v").collect();
        let report = checker(&files).run();
        assert!(!report.passed());
        assert_eq!(messages(&report), vec!["fa_1b.v: file not found"]);
    }

    #[test]
    fn test_forbidden_xor_operator() {
        let bad = "module xor_1b(input a, input b, output y);\n assign y = a ^ b;\nendmodule\n";
        let report = checker(&with("xor_1b.v", bad)).run();
        assert_eq!(messages(&report), vec!["xor_1b.v: found forbidden token '^'"]);
    }

    #[test]
    fn test_comments_are_ignored() {
        let commented = "module xor_1b(input a, input b, output y);\n/* a ^ b\n xnor */\n assign y = a | b;\nendmodule\n";
        let report = checker(&with("xor_1b.v", commented)).run();
        assert!(report.passed(), "{report}");
    }

    #[test]
    fn test_full_adder_must_reuse_xor() {
        let bad = "module fa_1b(input a, input b, input cin, output sum, output cout);\n assign sum = a ^ b ^ cin;\nendmodule\n";
        let report = checker(&with("fa_1b.v", bad)).run();
        let msgs = messages(&report);
        assert!(msgs.contains(&"fa_1b.v: missing required instantiation of 'xor_1b'".to_string()));
        assert!(msgs.contains(&"fa_1b.v: found forbidden token '^'".to_string()));
    }

    #[test]
    fn test_adder_instance_count_and_plus() {
        let three = "module adder_4b();\n fa_1b f0();\n fa_1b f1();\n fa_1b f2();\nendmodule\n";
        let report = checker(&with("adder_4b.v", three)).run();
        assert_eq!(
            messages(&report),
            vec!["adder_4b.v: expected 4 fa_1b instances, found 3"]
        );

        let behavioral = "module adder_4b(input [3:0] a, b, output [4:0] s);\n assign s = a + b;\nendmodule\n";
        let report = checker(&with("adder_4b.v", behavioral)).run();
        let msgs = messages(&report);
        assert_eq!(msgs.len(), 2);
        assert!(msgs[1].contains("'+' operator in assign"));
    }

    #[test]
    fn test_alu_with_few_xors_warns() {
        let alu = "module alu_4b();\n adder_4b add0();\n xor_1b x0();\nendmodule\n";
        let report = checker(&with("alu_4b.v", alu)).run();
        assert!(report.passed());
        assert_eq!(
            messages(&report),
            vec!["alu_4b.v: expected 4 xor_1b instances for XOR operation, found 1"]
        );
    }

    #[test]
    fn test_sequential_assignment_style() {
        let reg = r#"module alu_reg_4b(input clk, input reset_n, input [3:0] d, output reg [3:0] q);
    always @(posedge clk or negedge reset_n) begin
        if (!reset_n) begin
            q <= 4'b0;
        end else begin
            q = d;
        end
    end
endmodule
"#;
        let report = checker(&with("alu_reg_4b.v", reg)).run();
        assert!(report.passed());
        assert_eq!(
            messages(&report),
            vec![
                "alu_reg_4b.v:4: non-blocking assignment in reset branch (blocking '=' recommended)",
                "alu_reg_4b.v:6: blocking assignment in clocked branch (non-blocking '<=' recommended)",
            ]
        );
    }

    #[test]
    fn test_sequential_comparisons_are_not_assignments() {
        let fsm = r#"module decoder_fsm(input clk, input reset_n);
    always @(posedge clk or negedge reset_n) begin
        if (!reset_n) begin
            state = 0;
        end else begin
            if (state == 3'd4 && count != 0) state <= 0;
        end
    end
    assign busy = state != 0;
endmodule
"#;
        let report = checker(&with("decoder_fsm.v", fsm)).run();
        assert!(report.findings.is_empty(), "{report}");
    }

    #[test]
    fn test_missing_sequential_files_are_skipped() {
        let report = checker(&good()).run();
        assert!(report.findings.iter().all(|f| !SEQUENTIAL_FILES.contains(&f.file.as_str())));
    }

    #[test]
    fn test_from_dir_rejects_missing_directory() {
        let err = RtlChecker::from_dir("/nonexistent/rtl/dir").err().unwrap();
        assert!(matches!(err, LintError::DirectoryNotFound(_)));
    }
}
