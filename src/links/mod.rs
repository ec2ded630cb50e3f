/// Deep links, view actions, and search indexables
///
/// Links have the shape
/// `<base><collection>/?activeTokens=<token>&<id>=<value>...&keys=<id>,<id>`
/// and are returned percent-decoded, so they may need encoding again
/// before being sent over the wire.

use crate::model::{Team, FIELD_ACTIVE_TOKENS, TEAMS_COLLECTION, TEMPLATES_COLLECTION};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Query parameter listing the ids carried by a link
pub const KEYS: &str = "keys";

/// Visibility of an indexed document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexScope {
    CrossDevice,
}

/// Document handed to the search index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indexable {
    pub url: String,
    pub name: String,
    pub image: Option<String>,
    pub works_offline: bool,
    pub scope: IndexScope,
}

/// "View" action pointing at a deep link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewAction {
    pub name: String,
    pub url: String,
}

/// Builds links under a configurable app link base
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    teams_base: String,
    templates_base: String,
}

impl LinkBuilder {
    pub fn new(app_link_base: &str) -> Self {
        let base = if app_link_base.ends_with('/') {
            app_link_base.to_string()
        } else {
            format!("{}/", app_link_base)
        };

        Self {
            teams_base: format!("{}{}/", base, TEAMS_COLLECTION),
            templates_base: format!("{}{}/", base, TEMPLATES_COLLECTION),
        }
    }

    /// Link to a set of teams, optionally carrying a share token
    pub fn teams_link(&self, teams: &[Team], token: Option<&str>) -> String {
        generate_url(
            &self.teams_base,
            token,
            teams.iter().map(|team| (team.id.clone(), team.number.to_string())),
        )
    }

    /// Link to a single team
    pub fn team_deep_link(&self, team: &Team) -> String {
        self.teams_link(std::slice::from_ref(team), None)
    }

    pub fn template_link(&self, template_id: &str, token: Option<&str>) -> String {
        generate_url(
            &self.templates_base,
            token,
            std::iter::once((template_id.to_string(), true.to_string())),
        )
    }

    pub fn team_view_action(&self, team: &Team) -> ViewAction {
        ViewAction {
            name: team.to_string(),
            url: self.team_deep_link(team),
        }
    }

    pub fn template_view_action(&self, template_id: &str, name: &str) -> ViewAction {
        ViewAction {
            name: name.to_string(),
            url: self.template_link(template_id, None),
        }
    }

    /// Indexable for a team
    ///
    /// Touches the filesystem: media that exists as a local file is left
    /// out since it can't be shown from the index.
    pub fn team_indexable(&self, team: &Team) -> Indexable {
        let image = team
            .media
            .as_deref()
            .filter(|media| !media.trim().is_empty() && !Path::new(media).exists())
            .map(str::to_string);

        Indexable {
            url: self.team_deep_link(team),
            name: team.to_string(),
            image,
            works_offline: true,
            scope: IndexScope::CrossDevice,
        }
    }

    pub fn template_indexable(&self, template_id: &str, name: &str) -> Indexable {
        Indexable {
            url: self.template_link(template_id, None),
            name: name.to_string(),
            image: None,
            works_offline: true,
            scope: IndexScope::CrossDevice,
        }
    }
}

/// Append the token, one `<id>=<value>` per record, then `keys`
fn generate_url<I>(link_base: &str, token: Option<&str>, params: I) -> String
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut query: Vec<String> = Vec::new();
    if let Some(token) = token {
        query.push(encode_param(FIELD_ACTIVE_TOKENS, token));
    }

    let mut keys = Vec::new();
    for (key, value) in params {
        query.push(encode_param(&key, &value));
        keys.push(key);
    }
    query.push(encode_param(KEYS, &keys.join(",")));

    let url = format!("{}?{}", link_base, query.join("&"));
    match urlencoding::decode(&url) {
        Ok(decoded) => decoded.into_owned(),
        // Only reachable with non UTF-8 escapes, which encoding never produces
        Err(_) => url,
    }
}

fn encode_param(key: &str, value: &str) -> String {
    format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_APP_LINK_BASE;
    use tempfile::NamedTempFile;

    fn team(id: &str, number: i64) -> Team {
        Team {
            id: id.to_string(),
            number,
            name: None,
            media: None,
        }
    }

    fn links() -> LinkBuilder {
        LinkBuilder::new(DEFAULT_APP_LINK_BASE)
    }

    #[test]
    fn test_teams_link_without_token() {
        let url = links().teams_link(&[team("id1", 254), team("id2", 1678)], None);

        assert_eq!(
            url,
            "https://supercilex.github.io/Robot-Scouter/data/teams/?id1=254&id2=1678&keys=id1,id2"
        );
        assert!(!url.contains(FIELD_ACTIVE_TOKENS));
    }

    #[test]
    fn test_teams_link_with_token() {
        let url = links().teams_link(&[team("id1", 254)], Some("abc123"));

        assert!(url.contains("activeTokens=abc123"));
        assert!(url.contains("keys=id1"));
        assert!(url.contains("id1=254"));
    }

    #[test]
    fn test_template_link() {
        let url = links().template_link("tmpl", Some("tok"));
        assert_eq!(
            url,
            "https://supercilex.github.io/Robot-Scouter/data/templates/?activeTokens=tok&tmpl=true&keys=tmpl"
        );
    }

    #[test]
    fn test_link_is_percent_decoded() {
        let url = links().teams_link(&[team("a b", 1)], None);
        assert!(url.contains("a b=1"));
        assert!(url.ends_with("keys=a b"));
    }

    #[test]
    fn test_base_without_trailing_slash() {
        let url = LinkBuilder::new("https://example.com/data").template_link("t", None);
        assert!(url.starts_with("https://example.com/data/templates/?"));
    }

    #[test]
    fn test_indexable_keeps_remote_media() {
        let mut team = team("id1", 254);
        team.media = Some("https://example.com/254.png".to_string());

        let indexable = links().team_indexable(&team);
        assert_eq!(indexable.image.as_deref(), Some("https://example.com/254.png"));
        assert!(indexable.works_offline);
        assert_eq!(indexable.scope, IndexScope::CrossDevice);
        assert_eq!(indexable.name, "254");
    }

    #[test]
    fn test_indexable_drops_local_media() {
        let file = NamedTempFile::new().unwrap();
        let mut team = team("id1", 254);
        team.media = Some(file.path().to_string_lossy().into_owned());

        assert_eq!(links().team_indexable(&team).image, None);
    }

    #[test]
    fn test_indexable_drops_blank_media() {
        let mut team = team("id1", 254);
        team.media = Some("   ".to_string());

        assert_eq!(links().team_indexable(&team).image, None);
    }

    #[test]
    fn test_template_view_action() {
        let action = links().template_view_action("tmpl", "Match scouting");
        assert_eq!(action.name, "Match scouting");
        assert!(action.url.ends_with("templates/?tmpl=true&keys=tmpl"));
    }
}
