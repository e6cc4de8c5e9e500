#![forbid(unsafe_code)]

pub mod api_client;
pub mod auth;
pub mod controller;
pub mod error;
pub mod protocol;
pub mod question_supply;
pub mod score_sink;

pub use rush_core::Clock;

pub use api_client::{ApiClient, ApiConfig};
pub use auth::{CredentialProvider, EnvCredentials, StaticCredentials};
pub use controller::{FetchOutcome, PlayerEvent, RushController, RushUpdate};
pub use error::{ApiError, ControllerError, SubmitError, SupplyError};
pub use question_supply::{HttpQuestionSupply, QuestionSupply, RetryPolicy, UnseenQuestionSupply};
pub use score_sink::{HttpScoreSink, ScoreSink};
