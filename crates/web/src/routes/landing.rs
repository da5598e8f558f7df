//! Landing page.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::{IntoResponse, Redirect, Response};

use crate::filters;
use crate::middleware::OptionalAuth;

/// A headline number in the stats band.
pub struct Stat {
    pub value: &'static str,
    pub label: &'static str,
}

/// A card in the features grid.
pub struct Feature {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

const STATS: &[Stat] = &[
    Stat {
        value: "99.99%",
        label: "Uptime SLA",
    },
    Stat {
        value: "<50ms",
        label: "Global latency",
    },
    Stat {
        value: "10M+",
        label: "Requests/second",
    },
];

const FEATURES: &[Feature] = &[
    Feature {
        icon: "globe",
        title: "Global Edge Network",
        description: "Deploy to 300+ locations worldwide. Sub-50ms response times from anywhere on Earth.",
    },
    Feature {
        icon: "shield",
        title: "Enterprise Security",
        description: "SOC 2 Type II certified. End-to-end encryption. Zero-trust architecture.",
    },
    Feature {
        icon: "trending-up",
        title: "Infinite Scale",
        description: "Auto-scaling infrastructure that grows with your business. No ceiling.",
    },
    Feature {
        icon: "layers",
        title: "Composable Architecture",
        description: "API-first design. Integrate with any stack. Build exactly what you need.",
    },
    Feature {
        icon: "bar-chart",
        title: "Real-time Analytics",
        description: "Track everything. Understand your customers. Make data-driven decisions.",
    },
    Feature {
        icon: "zap",
        title: "Lightning Deploy",
        description: "Push to production in seconds. Instant rollbacks. Zero downtime.",
    },
];

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "landing.html")]
pub struct LandingTemplate {
    pub stats: &'static [Stat],
    pub features: &'static [Feature],
}

impl Default for LandingTemplate {
    fn default() -> Self {
        Self {
            stats: STATS,
            features: FEATURES,
        }
    }
}

/// Display the landing page, or send signed-in users to their dashboard.
pub async fn landing(OptionalAuth(auth): OptionalAuth) -> Response {
    if auth.is_some() {
        return Redirect::to("/dashboard").into_response();
    }

    LandingTemplate::default().into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_renders_sections() {
        let html = LandingTemplate::default().render().unwrap();
        assert!(html.contains("unprecedented scale"));
        assert!(html.contains("id=\"features\""));
        assert!(html.contains("id=\"enterprise\""));
        assert!(html.contains("Lightning Deploy"));
    }

    #[test]
    fn test_calls_to_action_target_auth_modes() {
        let html = LandingTemplate::default().render().unwrap();
        assert!(html.contains("href=\"/auth?mode=sign-in\">Sign In</a>"));
        assert!(html.contains("href=\"/auth?mode=sign-up\">Get Started</a>"));
    }
}
