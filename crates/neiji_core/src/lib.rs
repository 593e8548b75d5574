pub mod domain;
pub mod ports;
pub mod reveal;
pub mod timeline;
pub mod validation;

pub use domain::{
    AuthStep, ChatTurn, Message, MessageId, MessageIdSeq, NavAction, PasswordStrength, Role,
    SessionKey, StrengthLevel, User, PASSWORD_MASK,
};
pub use ports::{ChatCompletionService, PortError, PortResult, SessionRepository};
pub use reveal::{RevealFrame, RevealState};
pub use timeline::Timeline;
pub use validation::{
    password_strength, validate_email, validate_password, ValidationError, ValidationResult,
};
