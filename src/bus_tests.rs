//! Unit tests for the EventBus - the lane-to-host delivery channel.

#[cfg(test)]
mod bus_tests {
    use crate::bus::EventBus;
    use crate::events::{Event, NewsBatch, QuoteBatch};

    #[tokio::test]
    async fn test_eventbus_new() {
        let bus = EventBus::new(100);
        // Should be able to create a bus without panicking
        let _rx = bus.subscribe();
    }

    #[tokio::test]
    async fn test_eventbus_publish_subscribe() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        let event = Event::News(NewsBatch {
            items: Vec::new(),
            scanned: 7,
            feed_failures: Vec::new(),
        });

        // Publish should succeed
        let result = bus.publish(event);
        assert!(result.is_ok());

        // Subscriber should receive the event
        let received = rx.recv().await;
        assert!(received.is_ok());

        if let Ok(Event::News(batch)) = received {
            assert_eq!(batch.scanned, 7);
            assert!(batch.items.is_empty());
        } else {
            panic!("Expected News event");
        }
    }

    #[tokio::test]
    async fn test_eventbus_multiple_subscribers() {
        let bus = EventBus::new(100);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let event = Event::Quotes(QuoteBatch {
            snapshots: Vec::new(),
            failures: Vec::new(),
        });

        bus.publish(event).unwrap();

        // Both subscribers should receive the delivery
        assert!(matches!(rx1.recv().await, Ok(Event::Quotes(_))));
        assert!(matches!(rx2.recv().await, Ok(Event::Quotes(_))));
    }

    #[tokio::test]
    async fn test_eventbus_publish_without_subscriber_errors() {
        let bus = EventBus::new(100);

        let event = Event::Quotes(QuoteBatch {
            snapshots: Vec::new(),
            failures: Vec::new(),
        });

        // No receiver alive, publish surfaces the send error
        assert!(bus.publish(event).is_err());
    }

    #[tokio::test]
    async fn test_eventbus_delivery_order() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        for scanned in 0..3 {
            bus.publish(Event::News(NewsBatch {
                items: Vec::new(),
                scanned,
                feed_failures: Vec::new(),
            }))
            .unwrap();
        }

        // Deliveries come out in publish order
        for expected in 0..3 {
            match rx.recv().await.unwrap() {
                Event::News(batch) => assert_eq!(batch.scanned, expected),
                other => panic!("Expected News event, got {other:?}"),
            }
        }
    }
}
