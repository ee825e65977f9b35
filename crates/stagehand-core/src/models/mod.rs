//! Domain models for staged uploads.

pub mod upload;

pub use upload::{
    AcceptSessionInput, AcceptedFile, CancelSessionInput, CreateFileIntentsInput,
    CreateSessionInput, FileIntent, NewUploadFile, NewUploadSession, ObjectHead, PresignGetInput,
    UploadFile, UploadSession,
};
