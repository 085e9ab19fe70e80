use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_suffix() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}_{}", std::process::id(), nanos)
}

fn unique_data_path() -> String {
    let mut path = std::env::temp_dir();
    path.push(format!("goal_tracker_http_{}.json", unique_suffix()));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_goal_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", unique_data_path())
        .env_remove("REMOTE_API_URL")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

/// Each test works under its own user so the shared server needs no locking.
fn user_url(server: &TestServer, path: &str) -> String {
    format!("{}/api/users/user_{}{path}", server.base_url, unique_suffix())
}

async fn get_json(client: &Client, url: &str) -> Value {
    client.get(url).send().await.unwrap().json().await.unwrap()
}

#[tokio::test]
async fn http_session_rolls_up_into_day() {
    let server = shared_server().await;
    let client = Client::new();
    let base = user_url(&server, "");

    let goal: Value = client
        .post(format!("{base}/goals"))
        .json(&json!({
            "title": "Read",
            "category": "learning",
            "targetHours": 1,
            "startDate": "2024-01-10"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let goal_id = goal["id"].as_str().unwrap().to_string();
    assert_eq!(goal["endDate"], "2024-01-10");
    assert_eq!(goal["loggedHours"], 0.0);

    let response = client
        .post(format!("{base}/goals/{goal_id}/sessions"))
        .json(&json!({
            "date": "2024-01-10",
            "startTime": "2024-01-10T09:00:00Z",
            "endTime": "2024-01-10T09:45:00Z"
        }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let day = get_json(&client, &format!("{base}/days/2024-01-10")).await;
    assert_eq!(day["goals"].as_array().unwrap().len(), 1);
    assert!((day["totalLoggedHours"].as_f64().unwrap() - 0.75).abs() < 1e-9);
    assert_eq!(day["completedGoals"], 0);
    assert_eq!(day["summary"]["loggedTime"], "0h 45m");
}

#[tokio::test]
async fn http_delete_multi_day_goal_clears_range() {
    let server = shared_server().await;
    let client = Client::new();
    let base = user_url(&server, "");

    let goal: Value = client
        .post(format!("{base}/goals"))
        .json(&json!({
            "title": "Retreat",
            "category": "health",
            "targetHours": 2,
            "startDate": "2024-02-01",
            "endDate": "2024-02-03",
            "isMultiDay": true
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let goal_id = goal["id"].as_str().unwrap();

    let days = get_json(&client, &format!("{base}/days")).await;
    assert_eq!(days.as_object().unwrap().len(), 3);

    let active = get_json(&client, &format!("{base}/goals?date=2024-02-02")).await;
    assert_eq!(active.as_array().unwrap().len(), 1);
    let after = get_json(&client, &format!("{base}/goals?date=2024-02-04")).await;
    assert!(after.as_array().unwrap().is_empty());

    let deleted: Value = client
        .delete(format!("{base}/goals/{goal_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted["deleted"], true);

    let days = get_json(&client, &format!("{base}/days")).await;
    for date in ["2024-02-01", "2024-02-02", "2024-02-03"] {
        assert!(days[date]["goals"].as_array().unwrap().is_empty(), "{date}");
        assert_eq!(days[date]["completedGoals"], 0);
    }
    assert!(get_json(&client, &format!("{base}/goals")).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn http_rejects_invalid_input() {
    let server = shared_server().await;
    let client = Client::new();
    let base = user_url(&server, "");

    let response = client
        .post(format!("{base}/goals"))
        .json(&json!({
            "title": "   ",
            "category": "work",
            "targetHours": 1,
            "startDate": "2024-01-10"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .post(format!("{base}/goals/missing/toggle"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .put(format!("{}/api/themes/current", server.base_url))
        .json(&json!({ "theme": "neon" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_health_reports_sync_disabled() {
    let server = shared_server().await;
    let client = Client::new();

    let health = get_json(&client, &format!("{}/api/health", server.base_url)).await;
    assert_eq!(health["status"], "OK");
    assert_eq!(health["remoteSync"], "Disabled");

    let hydrate: Value = client
        .post(user_url(&server, "/hydrate"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(hydrate["hydrated"], false);
}

#[tokio::test]
async fn http_todos_and_check_in() {
    let server = shared_server().await;
    let client = Client::new();
    let base = user_url(&server, "");

    let todo: Value = client
        .post(format!("{base}/todos"))
        .json(&json!({ "text": "stretch", "priority": "high" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(todo["priority"], "high");
    let todo_id = todo["id"].as_str().unwrap();

    let toggled: Value = client
        .post(format!("{base}/todos/{todo_id}/toggle"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(toggled["completed"], true);

    let first: Value = client
        .post(format!("{base}/check-in"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["checkedIn"], true);
    assert_eq!(first["stats"]["currentStreak"], 1);

    let second: Value = client
        .post(format!("{base}/check-in"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["checkedIn"], false);
    assert_eq!(second["stats"]["totalCheckIns"], 1);
}
