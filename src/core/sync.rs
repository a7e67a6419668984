//! Lock helpers which keep going with the inner value of a poisoned lock.

use std::sync::{
    Mutex,
    MutexGuard,
    PoisonError,
    RwLock,
    RwLockReadGuard,
    RwLockWriteGuard,
};

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_lock_poisoned_mutex() {
        let mutex = Arc::new(Mutex::new(1));
        let _mutex = mutex.clone();
        let _ = thread::spawn(move || {
            let _guard = _mutex.lock().unwrap();
            panic!("poison");
        })
        .join();

        assert!(mutex.is_poisoned());
        *lock(&mutex) += 1;
        assert_eq!(*lock(&mutex), 2);
    }

    #[test]
    fn test_read_write_poisoned_rwlock() {
        let rwlock = Arc::new(RwLock::new(vec![1]));
        let _rwlock = rwlock.clone();
        let _ = thread::spawn(move || {
            let _guard = _rwlock.write().unwrap();
            panic!("poison");
        })
        .join();

        write(&rwlock).push(2);
        assert_eq!(*read(&rwlock), vec![1, 2]);
    }
}
