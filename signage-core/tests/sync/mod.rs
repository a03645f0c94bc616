// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Tests for display synchronization


mod cache_tests;
mod cycle_tests;
mod schedule_tests;
