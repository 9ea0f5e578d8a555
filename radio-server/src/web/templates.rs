//! Askama templates for the web frontend.
//!
//! Every page extends `base.html`, which renders the navigation bar and the
//! login form. The login form posts the current `path` so a login returns
//! to the same page.

use askama::Template;

use crate::domain::{FavouriteStation, StationRecord};

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// Map page.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub username: Option<String>,
    pub path: &'static str,
    pub login_failed: bool,
    pub api_key: String,
    pub favourites: Vec<StationView>,
}

/// About page.
#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub username: Option<String>,
    pub path: &'static str,
    pub login_failed: bool,
}

/// Error page.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub username: Option<String>,
    pub path: &'static str,
    pub login_failed: bool,
    pub title: String,
    pub message: String,
    pub details: Option<String>,
}

impl ErrorTemplate {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            username: None,
            path: "/",
            login_failed: false,
            title: title.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// Full station list.
#[derive(Template)]
#[template(path = "stations.html")]
pub struct StationsTemplate {
    pub username: Option<String>,
    pub path: &'static str,
    pub login_failed: bool,
    pub sort: &'static str,
    pub stations: Vec<StationView>,
    /// Outcome of the last favourite add, if redirected here
    pub notice: Option<Notice>,
}

/// The logged-in user's favourites.
#[derive(Template)]
#[template(path = "favourites.html")]
pub struct FavouritesTemplate {
    pub username: Option<String>,
    pub path: &'static str,
    pub login_failed: bool,
    pub stations: Vec<StationView>,
    pub deleted: bool,
}

/// Registration form.
#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub username: Option<String>,
    pub path: &'static str,
    pub login_failed: bool,
    pub error: Option<String>,
}

// ============================================================================
// View Models (for templates)
// ============================================================================

/// Flash-style message after a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub success: bool,
    pub message: String,
}

impl Notice {
    /// Message for a `/stations` redirect. Unknown codes show nothing.
    pub fn from_flags(error: Option<&str>, success: Option<&str>) -> Option<Self> {
        let failure = |message: &str| {
            Some(Notice {
                success: false,
                message: message.to_string(),
            })
        };

        match error {
            Some("limit") => failure("You already have five favourites. Remove one first."),
            Some("taken") => failure("That station is already a favourite."),
            Some("unknown") => failure("That station does not exist."),
            Some("login") => failure("Log in to save favourites."),
            _ if success.is_some() => Some(Notice {
                success: true,
                message: "Added to favourites.".to_string(),
            }),
            _ => None,
        }
    }
}

/// Message shown on the registration form for an `error` code.
pub fn register_message(code: &str) -> Option<&'static str> {
    match code {
        "username" => Some("Please choose a username."),
        "password" => Some("Please choose a password."),
        "confirmation" => Some("Please confirm your password."),
        "mismatch" => Some("Passwords do not match."),
        "taken" => Some("That username is taken."),
        _ => None,
    }
}

/// Station view model for templates.
#[derive(Debug, Clone)]
pub struct StationView {
    pub id: i64,
    pub name: String,
    pub call: String,
    pub freq: String,
    pub power: String,
    pub city: String,
    pub state: String,
    pub url_stream: Option<String>,
    pub url_site: Option<String>,
}

impl StationView {
    /// "City, ST", or empty when the station has no place.
    pub fn location(&self) -> String {
        if self.city.is_empty() {
            String::new()
        } else {
            format!("{}, {}", self.city, self.state)
        }
    }
}

impl From<&StationRecord> for StationView {
    fn from(record: &StationRecord) -> Self {
        let station = &record.station;
        let (city, state) = record
            .place
            .as_ref()
            .map(|p| (p.city.clone(), p.state.clone()))
            .unwrap_or_default();

        Self {
            id: station.id,
            name: station.name.clone(),
            call: station.call.clone(),
            freq: station.freq.clone().unwrap_or_default(),
            power: station.power.map(|w| format!("{w} W")).unwrap_or_default(),
            city,
            state,
            url_stream: station.url_stream.clone(),
            url_site: station.url_site.clone(),
        }
    }
}

impl From<&FavouriteStation> for StationView {
    fn from(favourite: &FavouriteStation) -> Self {
        Self::from(&favourite.record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Place, Station};

    fn record(place: bool) -> StationRecord {
        StationRecord::new(
            Station {
                id: 3,
                name: "WNYC".into(),
                call: "WNYC".into(),
                place_id: place.then_some(1),
                url_stream: None,
                url_site: None,
                freq: Some("93.9 FM".into()),
                power: Some(6_000),
            },
            place.then(|| Place {
                id: 1,
                city: "New York".into(),
                state: "NY".into(),
                lat: 40.71,
                lng: -74.01,
            }),
        )
    }

    #[test]
    fn station_view_formats_fields() {
        let view = StationView::from(&record(true));
        assert_eq!(view.location(), "New York, NY");
        assert_eq!(view.power, "6000 W");

        let view = StationView::from(&record(false));
        assert_eq!(view.location(), "");
    }

    #[test]
    fn notices() {
        let notice = Notice::from_flags(Some("limit"), None).unwrap();
        assert!(!notice.success);

        let notice = Notice::from_flags(None, Some("true")).unwrap();
        assert!(notice.success);

        assert_eq!(Notice::from_flags(Some("bogus"), None), None);
        assert_eq!(Notice::from_flags(None, None), None);
    }

    #[test]
    fn stations_page_renders() {
        let page = StationsTemplate {
            username: Some("alice".into()),
            path: "/stations",
            login_failed: false,
            sort: "place",
            stations: vec![StationView::from(&record(true))],
            notice: Notice::from_flags(Some("taken"), None),
        };

        let html = page.render().unwrap();
        assert!(html.contains("WNYC"));
        assert!(html.contains("New York, NY"));
        assert!(html.contains("already a favourite"));
        assert!(html.contains("alice"));
    }

    #[test]
    fn register_messages() {
        assert!(register_message("mismatch").is_some());
        assert!(register_message("other").is_none());
    }
}
