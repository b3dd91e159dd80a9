//! DTO tests for the API handlers
//!
//! These cover the request and response wire shapes without a database:
//! what the exchange submits, and what subscribers see on their bills.

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use rust_decimal_macros::dec;
    use tarifador_api::dto::{
        CallRecordRequest, CallRecordResponse, PhoneBillListResponse, PhoneBillQuery,
        PhoneBillResponse, TokenResponse,
    };
    use tarifador_core::models::{
        BilledCall, CallPair, CallRecord, CallType, PhoneBill, PhoneNumber, ReferencePeriod,
        Tariff,
    };
    use uuid::Uuid;
    use validator::Validate;

    fn ts(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .unwrap()
            .and_utc()
    }

    fn standard_pair() -> CallPair {
        let start = CallRecord::new(
            70,
            CallType::Start,
            ts("2016-02-29T12:00:00"),
            Some("99988526423".to_string()),
            Some("9933468278".to_string()),
        )
        .unwrap();
        let end = CallRecord::new(70, CallType::End, ts("2016-02-29T12:30:00"), None, None).unwrap();
        CallPair::new(start, end)
    }

    #[test]
    fn test_call_record_request_deserialization() {
        let json = r#"{
            "id": 1,
            "type": "start",
            "timestamp": "2016-02-29T12:00:00Z",
            "call_id": 70,
            "source": "+55 (99) 98852-6423",
            "destination": "9933468278"
        }"#;

        let req: CallRecordRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.call_type, CallType::Start);
        assert_eq!(req.call_id, 70);
        assert_eq!(req.timestamp, ts("2016-02-29T12:00:00"));
        assert_eq!(req.source.as_deref(), Some("+55 (99) 98852-6423"));
        assert_eq!(req.destination.as_deref(), Some("9933468278"));
    }

    #[test]
    fn test_end_leg_request_omits_numbers() {
        let json = r#"{
            "type": "end",
            "timestamp": "2016-02-29T14:00:00Z",
            "call_id": 70
        }"#;

        let req: CallRecordRequest = serde_json::from_str(json).unwrap();

        assert_eq!(req.call_type, CallType::End);
        assert!(req.source.is_none());
        assert!(req.destination.is_none());
    }

    #[test]
    fn test_call_record_request_validation() {
        let req = CallRecordRequest {
            call_type: CallType::Start,
            timestamp: ts("2016-02-29T12:00:00"),
            call_id: 0,
            source: Some("99988526423".to_string()),
            destination: Some("9933468278".to_string()),
        };
        assert!(req.validate().is_err());

        let req = CallRecordRequest { call_id: 70, ..req };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_call_record_response_serialization() {
        let record = CallRecord::new(
            70,
            CallType::Start,
            ts("2016-02-29T12:00:00"),
            Some("+55 (99) 98852-6423".to_string()),
            Some("9933468278".to_string()),
        )
        .unwrap();

        let response = CallRecordResponse::from(record);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["type"], "start");
        assert_eq!(value["call_id"], 70);
        assert_eq!(value["source"], "99988526423");
        assert_eq!(value["destination"], "9933468278");
        assert!(value["id"].is_string());
    }

    #[test]
    fn test_end_leg_response_has_null_numbers() {
        let record =
            CallRecord::new(70, CallType::End, ts("2016-02-29T12:30:00"), None, None).unwrap();

        let value = serde_json::to_value(CallRecordResponse::from(record)).unwrap();

        assert_eq!(value["type"], "end");
        assert!(value["source"].is_null());
        assert!(value["destination"].is_null());
    }

    #[test]
    fn test_billed_call_rendering() {
        use tarifador_api::dto::BilledCallDto;

        let call = BilledCall::from_pair(&standard_pair(), &Tariff::default()).unwrap();
        let dto = BilledCallDto::from(call);

        assert_eq!(dto.destination, "9933468278");
        assert_eq!(dto.call_duration, "0h30m0s");
        assert_eq!(dto.call_price, "R$ 3,06");

        let value = serde_json::to_value(&dto).unwrap();
        assert_eq!(value["call_start_date"], "2016-02-29");
        assert_eq!(value["call_start_time"], "12:00:00");
    }

    #[test]
    fn test_phone_bill_response_rendering() {
        let period = ReferencePeriod::parse("02/2016").unwrap();
        let subscriber = PhoneNumber::normalize("99988526423").unwrap();

        let mut bill = PhoneBill::new(subscriber, period);
        bill.add_call(BilledCall::from_pair(&standard_pair(), &Tariff::default()).unwrap());
        bill.add_call(BilledCall {
            call_id: 71,
            destination: PhoneNumber::normalize("9933468278").unwrap(),
            start_date: ts("2016-02-10T08:00:00").date_naive(),
            start_time: ts("2016-02-10T08:00:00").time(),
            duration: "0h10m0s".to_string(),
            price: dec!(1.26),
        });

        let response = PhoneBillResponse::from(bill);

        assert_eq!(response.phone_number, "99988526423");
        assert_eq!(response.total_amount, "R$ 4,32");
        assert_eq!(response.call_records.len(), 2);

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["reference_period"], "02/2016");
    }

    #[test]
    fn test_bill_list_is_empty_for_unknown_subscriber() {
        let response = PhoneBillListResponse::from(None);

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, serde_json::json!({ "bills": [] }));
    }

    #[test]
    fn test_bill_list_wraps_a_found_bill() {
        let period = ReferencePeriod::parse("02/2016").unwrap();
        let subscriber = PhoneNumber::normalize("99988526423").unwrap();
        let bill = PhoneBill::new(subscriber, period);

        let response = PhoneBillListResponse::from(Some(bill));

        assert_eq!(response.bills.len(), 1);
        assert_eq!(response.bills[0].total_amount, "R$ 0,00");
        assert!(response.bills[0].call_records.is_empty());
    }

    #[test]
    fn test_phone_bill_query_period_is_optional() {
        let query: PhoneBillQuery =
            serde_json::from_str(r#"{ "phone_number": "99988526423" }"#).unwrap();

        assert!(query.validate().is_ok());
        assert!(query.reference_period.is_none());

        let empty: PhoneBillQuery =
            serde_json::from_str(r#"{ "phone_number": "" }"#).unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_token_response_shape() {
        let user_id = Uuid::new_v4();
        let response = TokenResponse::new(
            "signed.jwt.token".to_string(),
            user_id,
            "mariazinha".to_string(),
        );

        assert_eq!(response.token_type, "bearer");

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["access_token"], "signed.jwt.token");
        assert_eq!(value["username"], "mariazinha");
        assert_eq!(value["user_id"], user_id.to_string());
    }
}
