//! DDM 声明文档构造
//!
//! 可选字段用 Option 表示，未设置时不输出。

use serde::Serialize;

pub const TYPE_PROPERTIES: &str = "com.apple.management.properties";
pub const TYPE_ACTIVATION: &str = "com.apple.activation.simple";
pub const TYPE_SUBSCRIPTIONS: &str = "com.apple.configuration.management.status-subscriptions";
pub const TYPE_LEGACY: &str = "com.apple.configuration.legacy";
pub const TYPE_LEGACY_INTERACTIVE: &str = "com.apple.configuration.legacy.interactive";
pub const TYPE_ORG_INFO: &str = "com.apple.management.organization-info";
pub const TYPE_TEST: &str = "com.apple.configuration.management.test";
pub const TYPE_WATCH_ENROLLMENT: &str = "com.apple.configuration.watch.enrollment";

/// 声明文档
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Declaration {
    #[serde(rename = "Type")]
    pub declaration_type: String,
    pub payload: Payload,
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Empty(EmptyPayload),
    Activation(ActivationPayload),
    Subscriptions(SubscriptionsPayload),
    Profile(ProfilePayload),
    OrgInfo(OrgInfoPayload),
    Test(TestPayload),
    WatchEnrollment(WatchEnrollmentPayload),
}

/// 序列化为 `{}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmptyPayload {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ActivationPayload {
    pub standard_configurations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusItem {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubscriptionsPayload {
    pub status_items: Vec<StatusItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProfilePayload {
    #[serde(rename = "ProfileURL")]
    pub profile_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Proof {
    pub identity_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrgInfoPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "URL", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TestPayload {
    pub echo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchEnrollmentPayload {
    #[serde(rename = "EnrollmentProfileURL")]
    pub enrollment_profile_url: String,
}

/// 可生成的声明种类及其参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationKind {
    Properties,
    Activation {
        declarations: Vec<String>,
        predicate: Option<String>,
    },
    Subscription {
        items: Vec<String>,
    },
    Profile {
        url: String,
    },
    InteractiveProfile {
        url: String,
        visible_name: String,
    },
    OrgInfo {
        name: String,
        email: Option<String>,
        url: Option<String>,
        identity_token: Option<String>,
    },
    Test {
        echo: String,
        return_status: Option<String>,
    },
    WatchEnrollment {
        url: String,
    },
}

impl DeclarationKind {
    pub fn declaration_type(&self) -> &'static str {
        match self {
            DeclarationKind::Properties => TYPE_PROPERTIES,
            DeclarationKind::Activation { .. } => TYPE_ACTIVATION,
            DeclarationKind::Subscription { .. } => TYPE_SUBSCRIPTIONS,
            DeclarationKind::Profile { .. } => TYPE_LEGACY,
            DeclarationKind::InteractiveProfile { .. } => TYPE_LEGACY_INTERACTIVE,
            DeclarationKind::OrgInfo { .. } => TYPE_ORG_INFO,
            DeclarationKind::Test { .. } => TYPE_TEST,
            DeclarationKind::WatchEnrollment { .. } => TYPE_WATCH_ENROLLMENT,
        }
    }

    pub fn payload(&self) -> Payload {
        match self.clone() {
            DeclarationKind::Properties => Payload::Empty(EmptyPayload {}),
            DeclarationKind::Activation {
                declarations,
                predicate,
            } => Payload::Activation(ActivationPayload {
                standard_configurations: declarations,
                predicate: predicate.filter(|p| !p.is_empty()),
            }),
            DeclarationKind::Subscription { items } => {
                Payload::Subscriptions(SubscriptionsPayload {
                    status_items: items.into_iter().map(|name| StatusItem { name }).collect(),
                })
            }
            DeclarationKind::Profile { url } => Payload::Profile(ProfilePayload {
                profile_url: url,
                visible_name: None,
            }),
            DeclarationKind::InteractiveProfile { url, visible_name } => {
                Payload::Profile(ProfilePayload {
                    profile_url: url,
                    visible_name: Some(visible_name),
                })
            }
            DeclarationKind::OrgInfo {
                name,
                email,
                url,
                identity_token,
            } => Payload::OrgInfo(OrgInfoPayload {
                name,
                email: email.filter(|e| !e.is_empty()),
                url: url.filter(|u| !u.is_empty()),
                proof: identity_token
                    .filter(|t| !t.is_empty())
                    .map(|identity_token| Proof { identity_token }),
            }),
            DeclarationKind::Test {
                echo,
                return_status,
            } => Payload::Test(TestPayload {
                echo,
                return_status: return_status.filter(|s| !s.is_empty()),
            }),
            DeclarationKind::WatchEnrollment { url } => {
                Payload::WatchEnrollment(WatchEnrollmentPayload {
                    enrollment_profile_url: url,
                })
            }
        }
    }
}

impl Declaration {
    /// 未指定标识时生成随机 UUID
    pub fn build(
        kind: &DeclarationKind,
        identifier: Option<String>,
        server_token: Option<String>,
    ) -> Self {
        Self {
            declaration_type: kind.declaration_type().to_string(),
            payload: kind.payload(),
            identifier: identifier.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            server_token: server_token.filter(|t| !t.is_empty()),
        }
    }

    /// 四空格缩进的 JSON
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        // serde_json 只输出合法的 UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}
