use super::*;

#[test]
fn shop_origin_adds_https_to_bare_domain() {
    assert_eq!(
        shop_origin("demo.myshop.test").unwrap(),
        "https://demo.myshop.test"
    );
}

#[test]
fn shop_origin_strips_path_from_full_url() {
    assert_eq!(
        shop_origin("https://demo.myshop.test/admin").unwrap(),
        "https://demo.myshop.test"
    );
}

#[test]
fn shop_origin_keeps_explicit_scheme_and_port() {
    assert_eq!(
        shop_origin("http://127.0.0.1:8080").unwrap(),
        "http://127.0.0.1:8080"
    );
}

#[test]
fn shop_origin_rejects_empty_host() {
    assert!(matches!(
        shop_origin("https://"),
        Err(CatalogError::InvalidShop { .. })
    ));
}

#[test]
fn collection_url_without_cursor() {
    let url = collection_products_url("demo.myshop.test", "col-1", 250, None).unwrap();
    assert_eq!(
        url,
        "https://demo.myshop.test/admin/collections/col-1/products.json?limit=250"
    );
}

#[test]
fn collection_url_with_cursor() {
    let url =
        collection_products_url("demo.myshop.test", "col-1", 250, Some("eyJsYXN0X2lkIjo2fQ"))
            .unwrap();
    assert_eq!(
        url,
        "https://demo.myshop.test/admin/collections/col-1/products.json?limit=250&page_info=eyJsYXN0X2lkIjo2fQ"
    );
}

#[test]
fn extract_host_handles_scheme_and_path() {
    assert_eq!(extract_host("https://demo.myshop.test/x"), "demo.myshop.test");
    assert_eq!(extract_host("demo.myshop.test"), "demo.myshop.test");
}
