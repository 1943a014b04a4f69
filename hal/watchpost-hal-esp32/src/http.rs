//! HTTP intake routers and form client over embassy-net
//!
//! The server side is `picoserve`: one router per node role, with every
//! form handler validating through `watchpost_core::provision::routes` and
//! queueing the resulting [`IntakeAction`]. The firmware drains the queue
//! and carries the actions out. The client side is `reqwless`, used to push
//! secrets and registrations to other nodes.

use core::fmt::Write;
use core::net::Ipv4Addr;

use embassy_net::dns::DnsSocket;
use embassy_net::tcp::client::{TcpClient, TcpClientState};
use embassy_net::Stack;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, WithTimeout};
use heapless::String;
use picoserve::extract::Form;
use picoserve::response::{File, Json, StatusCode};
use picoserve::routing::{get, get_service, post, PathRouter};
use picoserve::{Config, Router, Server, Timeouts};
use reqwless::client::HttpClient;
use reqwless::request::{Method, RequestBuilder};
use watchpost_core::provision::routes::{
    self, ModuleForm, OtpForm, PassForm, SsidForm, WifiForm, ACCEPTED, WIFI_SAVED,
};
use watchpost_core::provision::{
    form_body, FormTooLong, Health, IntakeAction, NodeStatus, Rejection, WifiStatus,
    PROVISIONING_PAGE,
};

pub const HTTP_PORT: u16 = 80;

/// Idle limit for both sides of a connection
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// Pause before an action that takes a link down, so the response leaves
pub const RESPONSE_GRACE_MS: u64 = 250;

/// Actions accepted but not yet carried out
pub const INTAKE_QUEUE_LEN: usize = 4;

pub type IntakeQueue = Channel<CriticalSectionRawMutex, IntakeAction, INTAKE_QUEUE_LEN>;

const TCP_BUFFER_LEN: usize = 1024;
const HTTP_BUFFER_LEN: usize = 2048;
const CLIENT_BUFFER_LEN: usize = 512;
const FORM_BODY_LEN: usize = 160;
/// `http://255.255.255.255` plus the longest API path
const URL_LEN: usize = 64;

/// What the form handlers need from the firmware
#[derive(Clone, Copy)]
pub struct Intake {
    queue: &'static IntakeQueue,
    status: fn() -> NodeStatus,
}

impl Intake {
    pub const fn new(queue: &'static IntakeQueue, status: fn() -> NodeStatus) -> Self {
        Self { queue, status }
    }

    fn wifi_status(self) -> Json<WifiStatus> {
        Json(WifiStatus::from((self.status)()))
    }

    /// Queue an accepted action and answer with `ok`
    async fn submit(
        self,
        result: Result<IntakeAction, Rejection>,
        ok: &'static str,
    ) -> (StatusCode, &'static str) {
        match result {
            Ok(action) => {
                self.queue.send(action).await;
                (StatusCode::OK, ok)
            }
            Err(rejection) => (StatusCode::BAD_REQUEST, rejection.message()),
        }
    }
}

/// Routes served by the display while its Setup page is open
pub fn display_router(intake: Intake) -> Router<impl PathRouter> {
    Router::new()
        .route("/", get_service(File::html(PROVISIONING_PAGE)))
        .route(
            "/save-wifi",
            post(move |Form(form): Form<WifiForm>| async move {
                intake.submit(routes::save_wifi(form), WIFI_SAVED).await
            }),
        )
        .route("/api/health", get(|| async { Json(Health::OK) }))
        .route("/api/wifistatus", get(move || async move { intake.wifi_status() }))
        .route(
            "/api/onetimepass",
            post(move |Form(form): Form<OtpForm>| async move {
                intake.submit(routes::one_time_pass(form), ACCEPTED).await
            }),
        )
        .route(
            "/api/permanentpass",
            post(move |Form(form): Form<PassForm>| async move {
                intake.submit(routes::permanent_pass(form), ACCEPTED).await
            }),
        )
        .route(
            "/api/module",
            post(move |Form(form): Form<ModuleForm>| async move {
                intake.submit(routes::register_module(form), ACCEPTED).await
            }),
        )
        .route(
            "/api/newssid",
            post(move |Form(form): Form<SsidForm>| async move {
                intake.submit(routes::new_ssid(form), ACCEPTED).await
            }),
        )
        .route(
            "/api/newpass",
            post(move |Form(form): Form<PassForm>| async move {
                intake.submit(routes::new_pass(form), ACCEPTED).await
            }),
        )
        .route(
            "/api/encryptedpass",
            post(move |Form(form): Form<PassForm>| async move {
                intake.submit(routes::ap_password(form), ACCEPTED).await
            }),
        )
}

/// Routes the sensor always serves
pub fn sensor_router(intake: Intake) -> Router<impl PathRouter> {
    Router::new()
        .route("/api/health", get(|| async { Json(Health::OK) }))
        .route("/api/wifistatus", get(move || async move { intake.wifi_status() }))
        .route(
            "/api/onetimepass",
            post(move |Form(form): Form<OtpForm>| async move {
                intake.submit(routes::one_time_pass(form), ACCEPTED).await
            }),
        )
        .route(
            "/api/permanentpass",
            post(move |Form(form): Form<PassForm>| async move {
                intake.submit(routes::permanent_pass(form), ACCEPTED).await
            }),
        )
        .route(
            "/api/mainconnection",
            post(move |Form(form): Form<PassForm>| async move {
                intake.submit(routes::main_connection(form), ACCEPTED).await
            }),
        )
        .route(
            "/api/module",
            post(move |Form(form): Form<ModuleForm>| async move {
                intake.submit(routes::register_module(form), ACCEPTED).await
            }),
        )
}

/// Serve `app` on [`HTTP_PORT`], one connection at a time, forever
///
/// Every connection is closed after its response.
pub async fn serve<P: PathRouter>(stack: Stack<'_>, app: &Router<P>) -> ! {
    let config = Config::new(Timeouts {
        start_read_request: Some(HTTP_TIMEOUT),
        persistent_start_read_request: Some(HTTP_TIMEOUT),
        read_request: Some(HTTP_TIMEOUT),
        write: Some(HTTP_TIMEOUT),
    })
    .close_connection_after_response();

    let mut rx = [0u8; TCP_BUFFER_LEN];
    let mut tx = [0u8; TCP_BUFFER_LEN];
    let mut http_buffer = [0u8; HTTP_BUFFER_LEN];

    loop {
        let _ = Server::new(app, &config, &mut http_buffer)
            .listen_and_serve(0usize, stack, HTTP_PORT, &mut rx, &mut tx)
            .await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HttpClientError {
    /// Body or URL does not fit its buffer
    TooLong,
    /// Connect, write or read failed
    Request,
    /// No complete response within [`HTTP_TIMEOUT`]
    Timeout,
    /// Remote answered with a non-2xx status
    Rejected,
}

impl From<FormTooLong> for HttpClientError {
    fn from(_: FormTooLong) -> Self {
        HttpClientError::TooLong
    }
}

impl From<reqwless::Error> for HttpClientError {
    fn from(_: reqwless::Error) -> Self {
        HttpClientError::Request
    }
}

/// POST `field=value` to `host` and check for a 2xx reply
pub async fn post_form(
    stack: Stack<'_>,
    host: Ipv4Addr,
    path: &str,
    field: &str,
    value: &str,
) -> Result<(), HttpClientError> {
    let body = form_body::<FORM_BODY_LEN>(field, value)?;
    let mut url = String::<URL_LEN>::new();
    write!(url, "http://{}{}", host, path).map_err(|_| HttpClientError::TooLong)?;

    let state = TcpClientState::<1, CLIENT_BUFFER_LEN, CLIENT_BUFFER_LEN>::new();
    let tcp = TcpClient::new(stack, &state);
    let dns = DnsSocket::new(stack);
    let mut client = HttpClient::new(&tcp, &dns);
    let mut rx = [0u8; CLIENT_BUFFER_LEN];
    let headers = [("Content-Type", "application/x-www-form-urlencoded")];

    let exchange = async {
        let mut request = client
            .request(Method::POST, &url)
            .await?
            .headers(&headers)
            .body(body.as_bytes());
        let response = request.send(&mut rx).await?;
        Ok::<_, HttpClientError>(response.status)
    };
    let status = exchange
        .with_timeout(HTTP_TIMEOUT)
        .await
        .map_err(|_| HttpClientError::Timeout)??;

    if status.is_successful() {
        Ok(())
    } else {
        Err(HttpClientError::Rejected)
    }
}
