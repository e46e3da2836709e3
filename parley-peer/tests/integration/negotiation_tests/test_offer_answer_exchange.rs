use parley_core::{SdpType, SignalingState};

use crate::integration::init_tracing;
use crate::utils::{MOCK_FINGERPRINT, drain, mock_adapter, negotiate, next_item};

#[tokio::test]
async fn test_offer_answer_exchange() {
    init_tracing();

    let (a, _) = mock_adapter();
    let (b, _) = mock_adapter();
    let mut a_states = a.signaling_states();
    let mut b_states = b.signaling_states();

    let (offer, answer) = negotiate(&a, &b).await.expect("Negotiation failed");

    assert_eq!(a.signaling_state(), SignalingState::Stable);
    assert_eq!(b.signaling_state(), SignalingState::Stable);

    assert_eq!(next_item(&mut a_states).await.unwrap(), SignalingState::HaveLocalOffer);
    assert_eq!(next_item(&mut a_states).await.unwrap(), SignalingState::Stable);
    assert_eq!(next_item(&mut b_states).await.unwrap(), SignalingState::HaveRemoteOffer);
    assert_eq!(next_item(&mut b_states).await.unwrap(), SignalingState::Stable);

    // The offer handed back is the description in effect, and it stays in effect.
    assert_eq!(a.local_description().await, Some(offer.clone()));
    assert_eq!(a.remote_description().await, Some(answer.clone()));
    assert_eq!(b.remote_description().await, Some(offer));
    assert_eq!(answer.sdp_type, SdpType::Answer);
    assert_eq!(b.local_description().await, Some(answer));

    a.close().await;
    b.close().await;
}

#[tokio::test]
async fn test_offer_is_the_applied_description() {
    init_tracing();

    let (a, _) = mock_adapter();

    let offer = a.create_offer(None).await.expect("Failed to create offer");

    assert!(offer.sdp.contains(MOCK_FINGERPRINT));
    assert_eq!(a.local_description().await, Some(offer));
}

#[tokio::test]
async fn test_remote_offer_then_answer() {
    init_tracing();

    let (a, _) = mock_adapter();
    let (b, _) = mock_adapter();
    let mut b_states = b.signaling_states();

    let offer = a.create_offer(None).await.unwrap();

    b.set_remote(offer.clone()).await.expect("Failed to apply remote offer");
    assert_eq!(b.signaling_state(), SignalingState::HaveRemoteOffer);

    let answer = b.create_answer(offer).await.expect("Failed to answer");
    assert_eq!(answer.sdp_type, SdpType::Answer);
    assert_eq!(b.signaling_state(), SignalingState::Stable);

    assert_eq!(next_item(&mut b_states).await.unwrap(), SignalingState::HaveRemoteOffer);
    assert_eq!(next_item(&mut b_states).await.unwrap(), SignalingState::Stable);
    assert!(drain(&mut b_states).is_empty());
}

#[tokio::test]
async fn test_renegotiation_after_stable() {
    init_tracing();

    let (a, _) = mock_adapter();
    let (b, _) = mock_adapter();

    negotiate(&a, &b).await.expect("First negotiation failed");
    let (offer, _) = negotiate(&a, &b).await.expect("Renegotiation failed");

    assert_eq!(a.signaling_state(), SignalingState::Stable);
    assert_eq!(b.signaling_state(), SignalingState::Stable);
    assert_eq!(a.local_description().await, Some(offer));
}
