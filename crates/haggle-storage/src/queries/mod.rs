// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules for conversations and messages.

pub mod conversations;
pub mod messages;
