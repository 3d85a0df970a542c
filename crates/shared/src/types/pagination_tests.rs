use super::*;
use rstest::rstest;

#[test]
fn test_page_request_default() {
    let request = PageRequest::default();
    assert_eq!(request.page, 1);
    assert_eq!(request.page_size, 10);
}

#[test]
fn test_page_request_deserialize_defaults() {
    let request: PageRequest = serde_json::from_str("{}").unwrap();
    assert_eq!(request, PageRequest::default());

    let request: PageRequest = serde_json::from_str(r#"{"page":3,"pageSize":25}"#).unwrap();
    assert_eq!(request, PageRequest::new(3, 25));
}

#[rstest]
#[case(0, 10, 1, 10)]
#[case(1, 0, 1, 1)]
#[case(2, 500, 2, 100)]
#[case(7, 100, 7, 100)]
fn test_page_request_normalized(
    #[case] page: u32,
    #[case] page_size: u32,
    #[case] expected_page: u32,
    #[case] expected_size: u32,
) {
    let request = PageRequest::new(page, page_size).normalized();
    assert_eq!(request.page, expected_page);
    assert_eq!(request.page_size, expected_size);
}

#[test]
fn test_page_request_offset() {
    assert_eq!(PageRequest::new(1, 20).offset(), 0);
    assert_eq!(PageRequest::new(2, 20).offset(), 20);
    assert_eq!(PageRequest::new(u32::MAX, 100).offset(), u64::from(u32::MAX - 1) * 100);
}

#[test]
fn test_page_response_new() {
    let data = vec![1, 2, 3];
    let response = PageResponse::new(data.clone(), PageRequest::new(2, 3), 9);

    assert_eq!(response.data, data);
    assert_eq!(response.pagination.page, 2);
    assert_eq!(response.pagination.page_size, 3);
    assert_eq!(response.pagination.total, 9);
    assert_eq!(response.pagination.offset, 3);
}

#[test]
fn test_page_response_envelope_shape() {
    let response = PageResponse::new(vec!["a"], PageRequest::default(), 1);
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "data": ["a"],
            "pagination": {"page": 1, "pageSize": 10, "total": 1, "offset": 0}
        })
    );
}
