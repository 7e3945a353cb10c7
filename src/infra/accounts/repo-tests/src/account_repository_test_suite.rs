// Copyright Lectern Platform and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use chrono::Duration;
use dill::Catalog;
use lectern_accounts::*;
use pretty_assertions::assert_eq;

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_missing_account_not_found(catalog: &Catalog) {
    let account_repo = catalog.get_one::<dyn AccountRepository>().unwrap();

    let account = Account::test(1, AccountRole::Student);

    assert!(matches!(
        account_repo.get_account_by_id(&account.id).await,
        Err(GetAccountByIdError::NotFound(AccountNotFoundByIdError { account_id })) if account_id == account.id
    ));
    assert!(
        account_repo
            .find_account_by_wallet_address(&account.wallet_address)
            .await
            .unwrap()
            .is_none()
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_insert_and_locate_account(catalog: &Catalog) {
    let account_repo = catalog.get_one::<dyn AccountRepository>().unwrap();

    let student = Account::test(1, AccountRole::Student);
    let instructor = Account::test(2, AccountRole::Instructor);

    account_repo.create_account(&student).await.unwrap();
    account_repo.create_account(&instructor).await.unwrap();

    assert_eq!(
        account_repo.get_account_by_id(&student.id).await.unwrap(),
        student
    );
    assert_eq!(
        account_repo
            .find_account_by_wallet_address(&instructor.wallet_address)
            .await
            .unwrap(),
        Some(instructor)
    );
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_duplicate_wallet_address(catalog: &Catalog) {
    let account_repo = catalog.get_one::<dyn AccountRepository>().unwrap();

    let original = Account::test(1, AccountRole::Student);
    account_repo.create_account(&original).await.unwrap();

    let same_id = Account {
        wallet_address: Account::test(2, AccountRole::Student).wallet_address,
        ..original.clone()
    };
    assert!(matches!(
        account_repo.create_account(&same_id).await,
        Err(CreateAccountError::Duplicate(CreateAccountErrorDuplicate {
            account_field: CreateAccountDuplicateField::Id
        }))
    ));

    let same_wallet = Account::new_for_wallet(original.wallet_address, original.created_at);
    assert!(matches!(
        account_repo.create_account(&same_wallet).await,
        Err(CreateAccountError::Duplicate(CreateAccountErrorDuplicate {
            account_field: CreateAccountDuplicateField::WalletAddress
        }))
    ));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

pub async fn test_update_last_login(catalog: &Catalog) {
    let account_repo = catalog.get_one::<dyn AccountRepository>().unwrap();

    let account = Account::test(1, AccountRole::Student);
    account_repo.create_account(&account).await.unwrap();

    let signed_in_at = account.last_login_at + Duration::days(3);
    account_repo
        .update_last_login(&account.id, signed_in_at)
        .await
        .unwrap();

    let reloaded = account_repo.get_account_by_id(&account.id).await.unwrap();
    assert_eq!(reloaded.last_login_at, signed_in_at);
    assert_eq!(reloaded.created_at, account.created_at);

    let stranger = Account::test(9, AccountRole::Student);
    assert!(matches!(
        account_repo
            .update_last_login(&stranger.id, signed_in_at)
            .await,
        Err(UpdateAccountLastLoginError::NotFound(_))
    ));
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
