// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod batch_scrape_test;
pub mod fetcher_wiremock_test;
pub mod pipeline_test;
pub mod webhook_api_test;
