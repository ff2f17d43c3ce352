// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

//! agent-hub-engine: the stateful machinery that runs on top of the state
//! store and the adapters — the chat runtime manager, the project build
//! pipeline, the title generator, the auto-configure worker, and the
//! startup reconciler.

pub mod artifact_store;
pub mod auto_configure;
pub mod build_pipeline;
pub mod pty_session;
pub mod reconciler;
pub mod terminal;
pub mod title_generator;
pub mod token_broker;

pub use artifact_store::{archive_on_new_prompt, chat_artifact_dir, ingest, stage_upload};
pub use auto_configure::{AutoConfigWorker, BuildRecipe};
pub use agent_hub_adapters::SecretResolver;
pub use build_pipeline::{BuildWorker, CancelFlag, ImageInspector};
pub use pty_session::{ChatRuntime, ChatRuntimeEvent, ChatRuntimeRegistry, OutputFanout, PTY_COLS, PTY_ROWS};
pub use reconciler::{reconcile, ContainerInfo, ContainerInspector, ProcessProbe, ReconcileReport, CHAT_CONTAINER_PREFIX, SETUP_CONTAINER_PREFIX};
#[cfg(unix)]
pub use reconciler::SystemProcessProbe;
pub use terminal::{AnsiStripper, InputSideChannel};
pub use title_generator::{OpenAiCredentialSource, OpenAiCredentials, TitleWorker};
pub use token_broker::{hash_token, mint_start_tokens, token_matches, validate_ready_ack, IssuedToken, StartTokens};
