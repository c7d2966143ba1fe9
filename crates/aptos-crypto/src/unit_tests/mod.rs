// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

mod ed25519_test;
mod hash_test;
mod secp256k1_test;
