//! 集合文件：每行一个声明 ID，`-` 前缀表示解除关联，`#` 开头为注释

use crate::core::outcome::Outcome;
use crate::core::report::Reporter;
use crate::core::scanner::SetFile;
use crate::core::state::RunState;
use crate::remote::ManagementApi;
use tracing::{debug, warn};

/// 集合文件中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetDirective {
    /// 注释或空行
    Comment,
    Associate(String),
    Dissociate(String),
}

impl SetDirective {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return SetDirective::Comment;
        }
        match line.strip_prefix('-') {
            Some(rest) => SetDirective::Dissociate(rest.trim().to_string()),
            None => SetDirective::Associate(line.to_string()),
        }
    }

    pub fn declaration_id(&self) -> Option<&str> {
        match self {
            SetDirective::Comment => None,
            SetDirective::Associate(id) | SetDirective::Dissociate(id) => Some(id),
        }
    }
}

/// 解析整个集合文件
pub fn parse_set_file(text: &str) -> Vec<SetDirective> {
    text.lines().map(SetDirective::parse).collect()
}

/// 集合编辑器
pub struct SetEditor<'a> {
    api: &'a dyn ManagementApi,
}

impl<'a> SetEditor<'a> {
    pub fn new(api: &'a dyn ManagementApi) -> Self {
        Self { api }
    }

    /// 依次执行集合文件中的每条指令，任一指令产生变更即视为集合已变更
    pub async fn apply(&self, file: &SetFile, state: &mut RunState, reporter: &mut Reporter) {
        let set_name = &file.set_name;
        let text = match tokio::fs::read_to_string(&file.path).await {
            Ok(t) => t,
            Err(e) => {
                state.record_failure();
                reporter.error(format!("reading {}: {}", file.relative, e));
                return;
            }
        };

        let mut changed_set = false;
        for directive in parse_set_file(&text) {
            let Some(declaration_id) = directive.declaration_id() else {
                continue;
            };
            if declaration_id.is_empty() {
                warn!("集合文件 {} 中有空的解除关联行，跳过", file.relative);
                continue;
            }

            let dissociate = matches!(directive, SetDirective::Dissociate(_));
            let result = if dissociate {
                self.api.dissociate(set_name, declaration_id).await
            } else {
                self.api.associate(set_name, declaration_id).await
            };

            match Outcome::from_result(result) {
                Outcome::Changed => {
                    changed_set = true;
                    if dissociate {
                        reporter.info(format!(
                            "dissociated declaration {} from set {}",
                            declaration_id, set_name
                        ));
                    } else {
                        reporter.info(format!(
                            "associated declaration {} with set {}",
                            declaration_id, set_name
                        ));
                    }
                }
                Outcome::Unchanged => {
                    debug!("集合 {} 中 {} 未变化", set_name, declaration_id);
                }
                Outcome::Inconclusive(status) => {
                    reporter.warning(format!("unknown status code sets: {}", status));
                }
                Outcome::Failed(failure) => {
                    state.record_failure();
                    let verb = if dissociate {
                        "dissociating"
                    } else {
                        "associating"
                    };
                    reporter.error(format!(
                        "{} {} with {} ({}): {}",
                        verb, declaration_id, set_name, file.relative, failure
                    ));
                }
            }
        }

        state.record_set(set_name, changed_set);
    }
}
