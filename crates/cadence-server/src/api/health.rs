//! `GET /health` — grounded on `original_source/server.py::health_check`,
//! which returns a bare 200 "OK".

pub async fn health() -> &'static str {
    "OK"
}
