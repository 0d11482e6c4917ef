use chrono::{DateTime, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}
