// SPDX-FileCopyrightText: 2026 Haggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route-level tests of the persistence API.

mod common;

use common::start_gateway;
use serde_json::{json, Value};

const KEY: &[(&str, &str)] = &[("email", "a@b.com"), ("anuncio_id", "123")];

fn with_key<'a>(extra: &[(&'a str, &'a str)]) -> Vec<(&'a str, &'a str)> {
    let mut params = KEY.to_vec();
    params.extend_from_slice(extra);
    params
}

#[tokio::test]
async fn create_conversation_reports_existing() {
    let gw = start_gateway().await;
    let http = reqwest::Client::new();

    let first: Value = http
        .post(gw.url("/criar-conversa", KEY))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second: Value = http
        .post(gw.url("/criar-conversa", KEY))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(first["message"], "Conversa criada com sucesso");
    assert_eq!(first["created"], true);
    assert_eq!(second["message"], "Conversa já existe");
    assert_eq!(second["created"], false);
    assert_eq!(first["conversa_id"], second["conversa_id"]);
}

#[tokio::test]
async fn unknown_direction_is_422() {
    let gw = start_gateway().await;
    let resp = reqwest::Client::new()
        .post(gw.url("/receber-mensagem", &with_key(&[("tipo", "forwarded")])))
        .json(&json!({"mensagem": "Olá"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 422);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("forwarded"));
}

#[tokio::test]
async fn empty_message_is_422() {
    let gw = start_gateway().await;
    let resp = reqwest::Client::new()
        .post(gw.url("/enviar-mensagem", KEY))
        .json(&json!({"mensagem": ""}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn pending_lists_open_inbound_messages() {
    let gw = start_gateway().await;
    let http = reqwest::Client::new();

    for text in ["Olá", "Ainda tem?"] {
        let resp = http
            .post(gw.url("/receber-mensagem", &with_key(&[("tipo", "recebida")])))
            .json(&json!({ "mensagem": text }))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
    }

    let body: Value = http
        .get(gw.url("/conversas/pendentes", &[("email", "a@b.com")]))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let pending = body["conversas_pendentes"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["anuncio_id"], "123");
    assert_eq!(pending[0]["mensagens"][0]["mensagem"], "Olá");
    assert_eq!(pending[0]["mensagens"][1]["mensagem"], "Ainda tem?");
    assert_eq!(pending[0]["mensagens"][1]["tipo"], "recebida");
}

#[tokio::test]
async fn message_exists_and_filtered_listing() {
    let gw = start_gateway().await;
    let http = reqwest::Client::new();

    let missing: Value = http
        .get(gw.url(
            "/mensagem-existe",
            &with_key(&[("mensagem", "Olá"), ("tipo", "recebida")]),
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(missing, json!({"existe": false}));

    http.post(gw.url("/receber-mensagem", &with_key(&[("tipo", "recebida")])))
        .json(&json!({"mensagem": "Olá"}))
        .send()
        .await
        .unwrap();
    http.post(gw.url("/enviar-mensagem", KEY))
        .json(&json!({"mensagem": "Bom dia"}))
        .send()
        .await
        .unwrap();

    let found: Value = http
        .get(gw.url(
            "/mensagem-existe",
            &with_key(&[("mensagem", "Olá"), ("tipo", "recebida")]),
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(found, json!({"existe": true}));

    let answered: Value = http
        .get(gw.url(
            "/mensagens",
            &[("email", "a@b.com"), ("respondida", "true")],
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let conversas = answered["conversas"].as_array().unwrap();
    assert_eq!(conversas.len(), 1);
    assert_eq!(conversas[0]["mensagens"].as_array().unwrap().len(), 1);
    assert_eq!(conversas[0]["mensagens"][0]["mensagem"], "Olá");
}

#[tokio::test]
async fn listing_info_round_trip_and_missing_conversation() {
    let gw = start_gateway().await;
    let http = reqwest::Client::new();

    let empty: Value = http
        .get(gw.url("/info-anuncio", KEY))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(empty, json!({}));

    let info_params = with_key(&[
        ("nome_vendedor", "Maria"),
        ("titulo_anuncio", "Bicicleta"),
        ("preco_anuncio", "120 €"),
    ]);
    let resp = http
        .post(gw.url("/atualizar-info-anuncio", &info_params))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);

    http.post(gw.url("/criar-conversa", KEY)).send().await.unwrap();
    let resp = http
        .post(gw.url("/atualizar-info-anuncio", &info_params))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let info: Value = http
        .get(gw.url("/info-anuncio", KEY))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(info["nome_vendedor"], "Maria");
    assert_eq!(info["titulo_anuncio"], "Bicicleta");
    assert_eq!(info["preco_anuncio"], "120 €");
}

#[tokio::test]
async fn searched_info_is_written_once() {
    let gw = start_gateway().await;
    let http = reqwest::Client::new();

    let missing = http
        .post(gw.url(
            "/atualizar-searched-info",
            &with_key(&[("searched_info", "detalhes")]),
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    http.post(gw.url("/criar-conversa", KEY)).send().await.unwrap();

    let first: Value = http
        .post(gw.url(
            "/atualizar-searched-info",
            &with_key(&[("searched_info", "detalhes")]),
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let second: Value = http
        .post(gw.url(
            "/atualizar-searched-info",
            &with_key(&[("searched_info", "outros")]),
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(first["updated"], true);
    assert_eq!(second["updated"], false);
    assert!(second["status"].as_str().unwrap().contains("já está preenchido"));
}

#[tokio::test]
async fn health_is_public() {
    let gw = start_gateway().await;
    let resp = reqwest::get(format!("{}/health", gw.base_url())).await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}
