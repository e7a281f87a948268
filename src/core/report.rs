//! 运行报告
//!
//! 报告行写到标准输出，错误行以 `ERROR ` 开头，警告行以 `WARNING: ` 开头，
//! 便于脚本区分。诊断日志另走 tracing。

use serde::Serialize;

/// 报告行级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub level: LineLevel,
    pub message: String,
}

impl std::fmt::Display for ReportLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.level {
            LineLevel::Info => write!(f, "{}", self.message),
            LineLevel::Warning => write!(f, "WARNING: {}", self.message),
            LineLevel::Error => write!(f, "ERROR {}", self.message),
        }
    }
}

/// 报告收集器，可选择边运行边输出
#[derive(Debug, Default)]
pub struct Reporter {
    echo: bool,
    lines: Vec<ReportLine>,
}

impl Reporter {
    /// 边运行边打印到标准输出
    pub fn streaming() -> Self {
        Self {
            echo: true,
            lines: Vec::new(),
        }
    }

    /// 只收集，不打印
    pub fn quiet() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(LineLevel::Info, message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(LineLevel::Warning, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(LineLevel::Error, message.into());
    }

    fn push(&mut self, level: LineLevel, message: String) {
        let line = ReportLine { level, message };
        if self.echo {
            println!("{}", line);
        }
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<ReportLine> {
        self.lines
    }
}
