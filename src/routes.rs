//! Navigation rules: which paths exist, which need a signed-in user, and
//! where to go after signing in or out.

use crate::core::types::Session;

pub const LANDING: &str = "/";
pub const DASHBOARD: &str = "/user-dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Blog,
    BlogPost { slug: String },
    /// Result of the analysis just run; nothing stored to look up.
    AnalysisResult,
    StoredAnalysis { id: String },
    Dashboard,
    NotFound { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Render(Route),
    Redirect(&'static str),
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Self::Landing,
            ["blog"] => Self::Blog,
            ["blog", slug] => Self::BlogPost {
                slug: (*slug).to_string(),
            },
            ["analysis-result"] => Self::AnalysisResult,
            ["analysis-result", id] | ["analysis", id] => Self::StoredAnalysis {
                id: (*id).to_string(),
            },
            ["user-dashboard"] => Self::Dashboard,
            _ => Self::NotFound {
                path: path.to_string(),
            },
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Landing => LANDING.to_string(),
            Self::Blog => "/blog".to_string(),
            Self::BlogPost { slug } => format!("/blog/{slug}"),
            Self::AnalysisResult => "/analysis-result".to_string(),
            Self::StoredAnalysis { id } => format!("/analysis-result/{id}"),
            Self::Dashboard => DASHBOARD.to_string(),
            Self::NotFound { path } => path.clone(),
        }
    }

    pub fn requires_session(&self) -> bool {
        matches!(self, Self::Dashboard | Self::StoredAnalysis { .. })
    }
}

pub fn resolve(route: Route, has_session: bool) -> RouteDecision {
    if route.requires_session() && !has_session {
        return RouteDecision::Redirect(LANDING);
    }
    match route {
        Route::NotFound { .. } => RouteDecision::Redirect(LANDING),
        route => RouteDecision::Render(route),
    }
}

/// Where to land after the session changes.
pub fn after_auth_change(session: Option<&Session>) -> &'static str {
    match session {
        Some(_) => DASHBOARD,
        None => LANDING,
    }
}

/// Public link to a stored analysis.
pub fn share_link(origin: &str, id: &str) -> String {
    format!("{}/analysis/{id}", origin.trim_end_matches('/'))
}
