use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Form, Json, Router,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tracing::debug;

pub const ENVELOPE_KEY: &str = "subsonic-response";

/// Timestamp (ms) the sample library was last changed.
pub const LAST_MODIFIED: i64 = 1_300_000_000_000;

/// Account and protocol level the server answers with.
#[derive(Clone, Debug)]
pub struct ServerSettings {
    pub username: String,
    pub password: String,
    pub version: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "pass".to_string(),
            version: "1.6.0".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MusicFolder {
    pub id: u32,
    pub name: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(skip)]
    pub folder: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct Album {
    pub id: String,
    pub title: String,
    pub artist: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
}

/// Fixed catalogue served by the mock.
#[derive(Clone, Debug)]
pub struct Library {
    pub folders: Vec<MusicFolder>,
    pub artists: Vec<Artist>,
    pub albums: Vec<Album>,
    pub songs: Vec<Song>,
    /// Song ids currently playing.
    pub now_playing: Vec<String>,
}

impl Library {
    pub fn sample() -> Self {
        let artist = |id: &str, name: &str, folder| Artist {
            id: id.to_string(),
            name: name.to_string(),
            folder,
        };
        let album = |id: &str, title: &str, artist: &str| Album {
            id: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
        };
        let song = |id: &str, title: &str, artist: &str, album: &str| Song {
            id: id.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
        };
        Self {
            folders: vec![
                MusicFolder {
                    id: 1,
                    name: "Music".to_string(),
                },
                MusicFolder {
                    id: 2,
                    name: "Audiobooks".to_string(),
                },
            ],
            artists: vec![
                artist("ar-1", "ABBA", 1),
                artist("ar-2", "Aphex Twin", 1),
                artist("ar-3", "Boards of Canada", 1),
                artist("ar-4", "Neil Gaiman", 2),
            ],
            albums: vec![
                album("al-1", "Arrival", "ABBA"),
                album("al-2", "Selected Ambient Works 85-92", "Aphex Twin"),
                album("al-3", "Music Has the Right to Children", "Boards of Canada"),
                album("al-4", "Stardust", "Neil Gaiman"),
            ],
            songs: vec![
                song("so-1", "Dancing Queen", "ABBA", "Arrival"),
                song("so-2", "Money, Money, Money", "ABBA", "Arrival"),
                song("so-3", "Xtal", "Aphex Twin", "Selected Ambient Works 85-92"),
                song("so-4", "Roygbiv", "Boards of Canada", "Music Has the Right to Children"),
                song("so-5", "Stardust, Chapter 1", "Neil Gaiman", "Stardust"),
            ],
            now_playing: vec!["so-1".to_string()],
        }
    }
}

pub struct AppState {
    pub settings: ServerSettings,
    pub library: Library,
}

pub type SharedState = Arc<AppState>;

pub fn app() -> Router {
    app_with(ServerSettings::default())
}

pub fn app_with(settings: ServerSettings) -> Router {
    let state: SharedState = Arc::new(AppState {
        settings,
        library: Library::sample(),
    });
    Router::new()
        .route("/rest/{method}", get(call_get).post(call_post))
        .with_state(state)
}

pub async fn serve(listener: TcpListener, settings: ServerSettings) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(settings)).await
}

async fn call_get(
    State(state): State<SharedState>,
    Path(method): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    Json(respond(&state, &method, &params))
}

async fn call_post(
    State(state): State<SharedState>,
    Path(method): Path<String>,
    Form(params): Form<HashMap<String, String>>,
) -> Json<Value> {
    Json(respond(&state, &method, &params))
}

/// Answer one protocol call the way the media service does.
pub fn respond(state: &AppState, method: &str, params: &HashMap<String, String>) -> Value {
    debug!(method, "handling call");
    let version = state.settings.version.as_str();
    if let Err((code, message)) = authenticate(&state.settings, params) {
        return failed(version, code, &message);
    }

    let library = &state.library;
    match method {
        "ping" => ok(version, json!({})),
        "getLicense" => ok(
            version,
            json!({
                "license": {"valid": true, "email": "admin@example.com", "key": "0123456789abcdef"}
            }),
        ),
        "getMusicFolders" => ok(
            version,
            json!({"musicFolders": {"musicFolder": library.folders}}),
        ),
        "getNowPlaying" => {
            let entries: Vec<Value> = library
                .songs
                .iter()
                .filter(|song| library.now_playing.contains(&song.id))
                .map(|song| {
                    let mut entry = json!(song);
                    entry["username"] = json!(state.settings.username);
                    entry["minutesAgo"] = json!(0);
                    entry
                })
                .collect();
            ok(version, json!({"nowPlaying": {"entry": entries}}))
        }
        "getIndexes" => ok(version, json!({"indexes": indexes(library, params)})),
        "search" => ok(version, json!({"searchResult": search(library, params)})),
        "search2" => match params.get("query") {
            Some(query) => ok(
                version,
                json!({"searchResult2": search2(library, &query.to_lowercase(), params)}),
            ),
            None => failed(version, 10, "Required parameter is missing: query"),
        },
        other => failed(version, 70, &format!("Unknown method: {other}")),
    }
}

fn authenticate(
    settings: &ServerSettings,
    params: &HashMap<String, String>,
) -> Result<(), (i64, String)> {
    for key in ["u", "p", "v", "c"] {
        if !params.contains_key(key) {
            return Err((10, format!("Required parameter is missing: {key}")));
        }
    }
    let password = &params["p"];
    let password = match password.strip_prefix("enc:") {
        Some(hexed) => hex::decode(hexed)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok()),
        None => Some(password.clone()),
    };
    if params["u"] == settings.username && password.as_deref() == Some(settings.password.as_str()) {
        Ok(())
    } else {
        Err((40, "Wrong username or password.".to_string()))
    }
}

fn indexes(library: &Library, params: &HashMap<String, String>) -> Value {
    let folder = number::<u32>(params, "musicFolderId");
    let since = number::<i64>(params, "ifModifiedSince");

    let mut indexes = Map::new();
    indexes.insert("lastModified".to_string(), json!(LAST_MODIFIED));
    if since.map_or(true, |since| since < LAST_MODIFIED) {
        let mut groups: BTreeMap<String, Vec<&Artist>> = BTreeMap::new();
        for artist in library
            .artists
            .iter()
            .filter(|artist| folder.map_or(true, |id| artist.folder == id))
        {
            let letter = artist
                .name
                .chars()
                .next()
                .map(|c| c.to_ascii_uppercase().to_string())
                .unwrap_or_else(|| "#".to_string());
            groups.entry(letter).or_default().push(artist);
        }
        let index: Vec<Value> = groups
            .into_iter()
            .map(|(name, artists)| json!({"name": name, "artist": artists}))
            .collect();
        indexes.insert("index".to_string(), Value::Array(index));
    }
    Value::Object(indexes)
}

fn search(library: &Library, params: &HashMap<String, String>) -> Value {
    let field = |key: &str| params.get(key).map(|v| v.to_lowercase());
    let (artist, album, title, any) = (field("artist"), field("album"), field("title"), field("any"));
    let contains = |haystack: &str, needle: &Option<String>| {
        needle
            .as_ref()
            .map_or(true, |needle| haystack.to_lowercase().contains(needle.as_str()))
    };

    let hits: Vec<&Song> = library
        .songs
        .iter()
        .filter(|song| {
            contains(&song.artist, &artist)
                && contains(&song.album, &album)
                && contains(&song.title, &title)
                && any.as_ref().map_or(true, |any| {
                    [&song.artist, &song.album, &song.title]
                        .iter()
                        .any(|field| field.to_lowercase().contains(any.as_str()))
                })
        })
        .collect();
    let offset = number::<usize>(params, "offset").unwrap_or(0);
    let count = number::<usize>(params, "count").unwrap_or(20);
    let page: Vec<&&Song> = hits.iter().skip(offset).take(count).collect();
    json!({"offset": offset, "totalHits": hits.len(), "match": page})
}

fn search2(library: &Library, query: &str, params: &HashMap<String, String>) -> Value {
    fn page<'a, T: 'a>(
        items: impl Iterator<Item = &'a T>,
        params: &HashMap<String, String>,
        prefix: &str,
    ) -> Vec<&'a T> {
        let count = number::<usize>(params, &format!("{prefix}Count")).unwrap_or(20);
        let offset = number::<usize>(params, &format!("{prefix}Offset")).unwrap_or(0);
        items.skip(offset).take(count).collect()
    }

    let matches = |text: &str| text.to_lowercase().contains(query);
    let artists = page(
        library.artists.iter().filter(|a| matches(&a.name)),
        params,
        "artist",
    );
    let albums = page(
        library.albums.iter().filter(|a| matches(&a.title)),
        params,
        "album",
    );
    let songs = page(
        library.songs.iter().filter(|s| matches(&s.title)),
        params,
        "song",
    );
    json!({"artist": artists, "album": albums, "song": songs})
}

fn number<T: std::str::FromStr>(params: &HashMap<String, String>, key: &str) -> Option<T> {
    params.get(key).and_then(|v| v.parse().ok())
}

fn envelope(version: &str, status: &str, extra: Value) -> Value {
    let mut body = Map::new();
    body.insert("status".to_string(), json!(status));
    body.insert("version".to_string(), json!(version));
    body.insert("xmlns".to_string(), json!("http://subsonic.org/restapi"));
    if let Value::Object(extra) = extra {
        body.extend(extra);
    }
    let mut root = Map::new();
    root.insert(ENVELOPE_KEY.to_string(), Value::Object(body));
    Value::Object(root)
}

fn ok(version: &str, extra: Value) -> Value {
    envelope(version, "ok", extra)
}

fn failed(version: &str, code: i64, message: &str) -> Value {
    envelope(
        version,
        "failed",
        json!({"error": {"code": code, "message": message}}),
    )
}
