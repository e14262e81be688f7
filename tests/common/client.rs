//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all gateway endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use super::server::TestServer;
use reqwest::redirect::Policy;
use reqwest::Response;
use std::time::Duration;

/// HTTP test client with cookie-based session management
///
/// Redirects are not followed so tests can observe where pairing sends the
/// browser.
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new unpaired client
    ///
    /// Use this for testing pairing flows.
    /// For most tests, use `paired()` instead.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .redirect(Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client that went through the pairing flow
    ///
    /// Reads the code from what the player would display, as a user would.
    ///
    /// # Panics
    ///
    /// Panics if pairing fails (indicates test infrastructure problem).
    pub async fn paired(server: &TestServer) -> Self {
        let client = Self::new(server.base_url.clone());

        let response = client.request_code(None).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let code = server
            .displayed_code()
            .expect("No pairing code displayed after a challenge");

        let response = client.verify_code(&code).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::SEE_OTHER,
            "Pairing failed"
        );
        assert_eq!(location(&response), "/");

        client
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    // ========================================================================
    // Pairing Endpoints
    // ========================================================================

    /// POST /code
    pub async fn request_code(&self, previous_challenge: Option<&str>) -> Response {
        let mut form = Vec::new();
        if let Some(challenge) = previous_challenge {
            form.push(("challenge", challenge));
        }
        self.client
            .post(self.url("/code"))
            .form(&form)
            .send()
            .await
            .expect("Code request failed")
    }

    /// POST /verify-code
    pub async fn verify_code(&self, code: &str) -> Response {
        self.client
            .post(self.url("/verify-code"))
            .form(&[("code", code)])
            .send()
            .await
            .expect("Verify code request failed")
    }

    /// GET /wsticket
    pub async fn ws_ticket(&self) -> Response {
        self.get("/wsticket").await
    }

    /// GET /wsticket, returning the ticket itself
    pub async fn take_ws_ticket(&self) -> String {
        let response = self.ws_ticket().await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.text().await.expect("Failed to read ticket")
    }

    // ========================================================================
    // Events and Playback Endpoints
    // ========================================================================

    /// GET /longpolling
    pub async fn longpolling(&self) -> Response {
        self.get("/longpolling").await
    }

    /// GET /playback-event with the given query
    pub async fn playback_event(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/playback-event"))
            .query(query)
            .send()
            .await
            .expect("Playback event request failed")
    }

    /// GET /play with the given query
    pub async fn play(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/play"))
            .query(query)
            .send()
            .await
            .expect("Play request failed")
    }

    /// GET /play?id=
    pub async fn play_media(&self, id: i64) -> Response {
        self.play(&[("id", &id.to_string())]).await
    }

    /// GET /play-all with the given query
    pub async fn play_all(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/play-all"))
            .query(query)
            .send()
            .await
            .expect("Play all request failed")
    }

    /// GET /resume-playback
    pub async fn resume_playback(&self, audio: bool) -> Response {
        self.get(&format!("/resume-playback?audio={}", audio)).await
    }

    // ========================================================================
    // Library Endpoints
    // ========================================================================

    /// GET /album-list
    pub async fn get_album_list(&self) -> Response {
        self.get("/album-list").await
    }

    /// GET /album?id=
    pub async fn get_album(&self, id: i64) -> Response {
        self.get(&format!("/album?id={}", id)).await
    }

    /// GET /artist?id=
    pub async fn get_artist(&self, id: i64) -> Response {
        self.get(&format!("/artist?id={}", id)).await
    }

    /// GET /playlist?id=
    pub async fn get_playlist(&self, id: i64) -> Response {
        self.get(&format!("/playlist?id={}", id)).await
    }

    /// GET /video-list
    pub async fn get_video_list(&self) -> Response {
        self.get("/video-list").await
    }

    /// POST /playlist-create
    pub async fn playlist_create(&self, name: &str) -> Response {
        self.client
            .post(self.url("/playlist-create"))
            .form(&[("name", name)])
            .send()
            .await
            .expect("Playlist create request failed")
    }

    /// POST /playlist-add with one `playlists[]` entry per target
    pub async fn playlist_add(
        &self,
        media_type: &str,
        media_id: i64,
        playlists: &[i64],
    ) -> Response {
        let media_id = media_id.to_string();
        let mut form = vec![("mediaType", media_type.to_string()), ("mediaId", media_id)];
        form.extend(playlists.iter().map(|id| ("playlists[]", id.to_string())));
        self.client
            .post(self.url("/playlist-add"))
            .form(&form)
            .send()
            .await
            .expect("Playlist add request failed")
    }

    /// GET /search?search=
    pub async fn search(&self, query: &str) -> Response {
        self.client
            .get(self.url("/search"))
            .query(&[("search", query)])
            .send()
            .await
            .expect("Search request failed")
    }

    /// GET /history
    pub async fn get_history(&self) -> Response {
        self.get("/history").await
    }

    // ========================================================================
    // Browsing Endpoints
    // ========================================================================

    /// GET /storage-list
    pub async fn get_storage_list(&self) -> Response {
        self.get("/storage-list").await
    }

    /// GET /browse-list?path=
    pub async fn browse(&self, path: &str) -> Response {
        self.client
            .get(self.url("/browse-list"))
            .query(&[("path", path)])
            .send()
            .await
            .expect("Browse request failed")
    }

    // ========================================================================
    // Download and Artwork Endpoints
    // ========================================================================

    /// GET /prepare-download
    pub async fn prepare_download(&self, item_type: &str, id: i64) -> Response {
        self.get(&format!("/prepare-download?type={}&id={}", item_type, id))
            .await
    }

    /// GET /download?file=
    pub async fn download(&self, file_name: &str) -> Response {
        self.client
            .get(self.url("/download"))
            .query(&[("file", file_name)])
            .send()
            .await
            .expect("Download request failed")
    }

    /// GET /logfile-list
    pub async fn logfile_list(&self) -> Response {
        self.get("/logfile-list").await
    }

    /// POST /upload-media as a multipart form
    pub async fn upload_media(
        &self,
        description: &str,
        file_name: &str,
        content: &[u8],
    ) -> Response {
        let part =
            reqwest::multipart::Part::bytes(content.to_vec()).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("description", description.to_string())
            .part("media", part);
        self.client
            .post(self.url("/upload-media"))
            .multipart(form)
            .send()
            .await
            .expect("Upload request failed")
    }

    /// GET /artwork with the given query
    pub async fn artwork(&self, query: &[(&str, &str)]) -> Response {
        self.client
            .get(self.url("/artwork"))
            .query(query)
            .send()
            .await
            .expect("Artwork request failed")
    }

    /// GET /home status
    pub async fn home(&self) -> Response {
        self.get("/").await
    }
}

/// Location header of a redirect, empty when absent
pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .map(|v| v.to_str().unwrap_or_default().to_string())
        .unwrap_or_default()
}
