// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
pub mod dump;
pub mod inspect;
pub mod state;
pub mod verify;
