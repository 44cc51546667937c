//! Infrastructure 層
//!
//! ドメイン層が定義する trait の具体的な実装（インメモリの接続テーブル・
//! チャンネル索引・レートリミッタ、WebSocket MessagePusher）と、
//! プロトコルごとの DTO を提供します。

pub mod dto;
pub mod message_pusher;
pub mod rate_limiter;
pub mod repository;
