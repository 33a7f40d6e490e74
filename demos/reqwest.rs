// Copyright (c) 2022 Sebastian Wiesner <sebastian@swsnr.de>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#[cfg(target_os = "macos")]
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let client = system_truststore::reqwest::client_builder(&system_truststore::macos::Keychain, true)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .unwrap();

    let response = client
        .get("https://httpbin.org/status/200")
        .send()
        .await
        .unwrap();
    println!("Status code: {}", response.status());
}

#[cfg(not(target_os = "macos"))]
fn main() {
    eprintln!("This example needs the macOS trust store");
}
