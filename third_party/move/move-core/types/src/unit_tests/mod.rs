// Copyright (c) The Move Contributors
// SPDX-License-Identifier: Apache-2.0

mod type_tag_test;
