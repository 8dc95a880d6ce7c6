// SPDX-FileCopyrightText: © 2024 Sandman contributors
// SPDX-License-Identifier: MIT

pub mod descriptor;
pub mod infrastructure;
pub mod loader;
pub mod pop_resource;
pub mod util;
