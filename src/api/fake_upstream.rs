//! Stand-in for the club's REST API, served on a random local port.

use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpResponse, HttpServer, web};
use serde_json::{Value, json};

use crate::config::Config;
use crate::upstream::UpstreamClient;

/// Bodies returned by the GET endpoints.
#[derive(Clone)]
pub struct Canned {
    pub attendance_by_date: Value,
    pub attendance_by_id: Value,
    pub memberships_by_athlete: Value,
    pub memberships: Value,
    pub payments: Value,
}

impl Default for Canned {
    fn default() -> Self {
        Self {
            attendance_by_date: json!([]),
            attendance_by_id: json!({}),
            memberships_by_athlete: json!([]),
            memberships: json!([]),
            payments: json!([]),
        }
    }
}

/// Writes received by the fake API.
#[derive(Default)]
pub struct Writes {
    entries: AtomicUsize,
    exits: AtomicUsize,
}

impl Writes {
    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::SeqCst)
    }

    pub fn exits(&self) -> usize {
        self.exits.load(Ordering::SeqCst)
    }
}

pub struct FakeUpstream {
    pub config: Config,
    pub writes: web::Data<Writes>,
    handle: ServerHandle,
}

impl FakeUpstream {
    pub fn start(canned: Canned) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let writes = web::Data::new(Writes::default());
        let canned = web::Data::new(canned);
        let server_writes = writes.clone();

        let server = HttpServer::new(move || {
            App::new()
                .app_data(server_writes.clone())
                .app_data(canned.clone())
                .route(
                    "/api/asistencias/fecha/{date}",
                    web::get().to(|c: web::Data<Canned>| async move {
                        HttpResponse::Ok().json(&c.attendance_by_date)
                    }),
                )
                .route(
                    "/api/asistencias/entrada",
                    web::post().to(|w: web::Data<Writes>| async move {
                        w.entries.fetch_add(1, Ordering::SeqCst);
                        HttpResponse::Created().json(json!({ "idAsistencia": 99 }))
                    }),
                )
                .route(
                    "/api/asistencias/{id}/salida",
                    web::put().to(|w: web::Data<Writes>| async move {
                        w.exits.fetch_add(1, Ordering::SeqCst);
                        HttpResponse::Ok().json(json!({}))
                    }),
                )
                .route(
                    "/api/asistencias/{id}",
                    web::get().to(|c: web::Data<Canned>| async move {
                        HttpResponse::Ok().json(&c.attendance_by_id)
                    }),
                )
                .route(
                    "/api/membresias/atleta/{id}",
                    web::get().to(|c: web::Data<Canned>| async move {
                        HttpResponse::Ok().json(&c.memberships_by_athlete)
                    }),
                )
                .route(
                    "/api/membresias",
                    web::get().to(|c: web::Data<Canned>| async move {
                        HttpResponse::Ok().json(&c.memberships)
                    }),
                )
                .route(
                    "/api/pagos",
                    web::get().to(|c: web::Data<Canned>| async move {
                        HttpResponse::Ok().json(&c.payments)
                    }),
                )
        })
        .workers(1)
        .listen(listener)
        .unwrap()
        .run();

        let handle = server.handle();
        actix_web::rt::spawn(server);

        let config = Config {
            upstream_base_url: format!("http://127.0.0.1:{port}"),
            ..Config::default()
        };

        Self {
            config,
            writes,
            handle,
        }
    }

    pub fn client(&self) -> web::Data<UpstreamClient> {
        web::Data::new(UpstreamClient::new(&self.config).unwrap())
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}
