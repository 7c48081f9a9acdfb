// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod activation;
mod container;
mod value;
