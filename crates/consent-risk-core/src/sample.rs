/// Sample consent notice shipped with the CLI so users can try the analyzer without input.
pub const SAMPLE_CONSENT_TEXT: &str = "개인정보 수집·이용 동의서
수집 항목: 이름, 생년월일, 휴대전화, 이메일, 주소, 결제정보(카드), IP, 쿠키
수집·이용 목적: 서비스 제공, 고객 지원, 맞춤형 광고 및 마케팅(프로모션 안내)
보유·이용 기간: 관계법령에 따른 보존기간(최대 5년)
제3자 제공: 주식회사 ○○, ㈜△△ (결제/알림 대행), 데이터 분석 위탁
민감정보 및 고유식별정보는 수집하지 않습니다. 동의 거부 및 철회는 언제든지 가능합니다.
목적 달성 시 또는 보유기간 경과 시 지체 없이 파기합니다.";
