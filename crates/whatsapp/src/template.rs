//! Template message components and preview rendering.
//!
//! [`Component`] / [`Parameter`] mirror the provider's wire format and
//! are serialized as-is into outbound template payloads.
//! [`render_preview`] is storage/UI-only: it substitutes parameters
//! into the template's canonical body text so conversation history
//! shows what the guest actually read, not a component array.

use serde::{Deserialize, Serialize};

/// Placeholder marker for parameters the template names but the
/// components do not supply.
const MISSING_MARKER: &str = "…";

/// One template component (header/body/footer/button).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    #[serde(rename = "type")]
    pub kind: ComponentKind,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

/// Component slot within a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Header,
    Body,
    Footer,
    Button,
}

/// A single substitution parameter, positional or named.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Parameter {
    Text {
        text: String,
        /// Provider's named-parameter extension; positional when absent.
        #[serde(skip_serializing_if = "Option::is_none")]
        parameter_name: Option<String>,
    },
    Image {
        image: MediaRef,
    },
    Video {
        video: MediaRef,
    },
    Document {
        document: MediaRef,
    },
}

/// Media reference by hosted link or previously uploaded media id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Component {
    /// Body component with purely positional text parameters.
    pub fn body_positional(values: &[&str]) -> Self {
        Component {
            kind: ComponentKind::Body,
            parameters: values
                .iter()
                .map(|v| Parameter::Text {
                    text: (*v).to_string(),
                    parameter_name: None,
                })
                .collect(),
        }
    }

    /// Header component carrying one media link.
    pub fn header_media(kind: sherehe_core::media::MediaKind, link: &str) -> Self {
        let media = MediaRef {
            link: Some(link.to_string()),
            id: None,
        };
        let parameter = match kind {
            sherehe_core::media::MediaKind::Image => Parameter::Image { image: media },
            sherehe_core::media::MediaKind::Video => Parameter::Video { video: media },
            sherehe_core::media::MediaKind::Document => Parameter::Document { document: media },
        };
        Component {
            kind: ComponentKind::Header,
            parameters: vec![parameter],
        }
    }
}

/// Render a human-readable preview of a template message.
///
/// `body_text` is the template's canonical body with `{{1}}`-style
/// positional and `{{name}}`-style named placeholders. Body parameters
/// are substituted in; unmatched placeholders become `…`; a header
/// media parameter is prefixed as an attachment tag, e.g. `[image] `.
pub fn render_preview(body_text: &str, components: &[Component]) -> String {
    let mut positional: Vec<&str> = Vec::new();
    let mut named: Vec<(&str, &str)> = Vec::new();
    let mut attachment: Option<&'static str> = None;

    for component in components {
        match component.kind {
            ComponentKind::Body => {
                for parameter in &component.parameters {
                    if let Parameter::Text {
                        text,
                        parameter_name,
                    } = parameter
                    {
                        match parameter_name {
                            Some(name) => named.push((name.as_str(), text.as_str())),
                            None => positional.push(text.as_str()),
                        }
                    }
                }
            }
            ComponentKind::Header => {
                for parameter in &component.parameters {
                    attachment = match parameter {
                        Parameter::Image { .. } => Some("[image] "),
                        Parameter::Video { .. } => Some("[video] "),
                        Parameter::Document { .. } => Some("[document] "),
                        Parameter::Text { .. } => None,
                    };
                }
            }
            ComponentKind::Footer | ComponentKind::Button => {}
        }
    }

    let mut rendered = substitute(body_text, &positional, &named);
    if let Some(tag) = attachment {
        rendered.insert_str(0, tag);
    }
    rendered
}

/// Replace `{{...}}` placeholders with their values.
///
/// `{{N}}` (1-based) draws from the positional list; anything else is
/// looked up by name; misses render as the ellipsis marker.
fn substitute(body: &str, positional: &[&str], named: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            // Unterminated placeholder: emit literally and stop.
            out.push_str(&rest[open..]);
            return out;
        };
        let key = after[..close].trim();

        let value = if let Ok(index) = key.parse::<usize>() {
            index
                .checked_sub(1)
                .and_then(|i| positional.get(i).copied())
        } else {
            named
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| *value)
        };

        out.push_str(value.unwrap_or(MISSING_MARKER));
        rest = &after[close + 2..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sherehe_core::media::MediaKind;

    #[test]
    fn positional_substitution() {
        let components = [Component::body_positional(&["Amina", "Saturday"])];
        let preview = render_preview("Hello {{1}}, see you {{2}}!", &components);
        assert_eq!(preview, "Hello Amina, see you Saturday!");
    }

    #[test]
    fn named_substitution() {
        let components = [Component {
            kind: ComponentKind::Body,
            parameters: vec![Parameter::Text {
                text: "Amina".into(),
                parameter_name: Some("guest".into()),
            }],
        }];
        let preview = render_preview("Karibu {{guest}}!", &components);
        assert_eq!(preview, "Karibu Amina!");
    }

    #[test]
    fn unmatched_placeholder_becomes_ellipsis() {
        let components = [Component::body_positional(&["Amina"])];
        let preview = render_preview("Hello {{1}}, table {{2}}", &components);
        assert_eq!(preview, "Hello Amina, table …");
    }

    #[test]
    fn header_media_prefixes_attachment_tag() {
        let components = [
            Component::header_media(MediaKind::Image, "https://cdn/card.png"),
            Component::body_positional(&["Amina"]),
        ];
        let preview = render_preview("Hello {{1}}", &components);
        assert_eq!(preview, "[image] Hello Amina");
    }

    #[test]
    fn no_components_leaves_placeholders_as_ellipsis() {
        assert_eq!(render_preview("Hi {{1}}", &[]), "Hi …");
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        assert_eq!(render_preview("Hi {{1", &[]), "Hi {{1");
    }

    #[test]
    fn component_serializes_to_wire_shape() {
        let component = Component::header_media(MediaKind::Image, "https://cdn/x.png");
        let json = serde_json::to_value(&component).unwrap();
        assert_eq!(json["type"], "header");
        assert_eq!(json["parameters"][0]["type"], "image");
        assert_eq!(json["parameters"][0]["image"]["link"], "https://cdn/x.png");
    }

    #[test]
    fn named_parameter_serializes_parameter_name() {
        let parameter = Parameter::Text {
            text: "Amina".into(),
            parameter_name: Some("guest".into()),
        };
        let json = serde_json::to_value(&parameter).unwrap();
        assert_eq!(json["parameter_name"], "guest");
    }
}
